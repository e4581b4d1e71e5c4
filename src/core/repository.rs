use crate::domain::model::{Customer, Hotel, Reservation};
use crate::domain::ports::{ConfigProvider, Entity, Storage};
use crate::utils::error::{DeskError, Result};
use serde::de::{Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::error::Category;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A stored record that failed validation and was left out of a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub key: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct LoadReport<T> {
    pub entities: BTreeMap<String, T>,
    pub skipped: Vec<SkippedRecord>,
}

impl<T> Default for LoadReport<T> {
    fn default() -> Self {
        Self {
            entities: BTreeMap::new(),
            skipped: Vec::new(),
        }
    }
}

/// File names of the three collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreFiles {
    pub hotels: String,
    pub customers: String,
    pub reservations: String,
}

impl Default for StoreFiles {
    fn default() -> Self {
        Self {
            hotels: "hotels.json".to_string(),
            customers: "customers.json".to_string(),
            reservations: "reservations.json".to_string(),
        }
    }
}

impl ConfigProvider for StoreFiles {
    fn hotels_file(&self) -> &str {
        &self.hotels
    }

    fn customers_file(&self) -> &str {
        &self.customers
    }

    fn reservations_file(&self) -> &str {
        &self.reservations
    }
}

/// Loads and saves whole collections, one store per entity type.
///
/// Each store is a JSON object mapping identifier to record. Loading is
/// tolerant: a record that fails entity validation is reported and skipped.
/// Only a store that cannot be read or parsed at all is an error.
#[derive(Debug)]
pub struct Repository<S: Storage> {
    storage: S,
    files: StoreFiles,
}

impl<S: Storage> Repository<S> {
    pub fn new<C: ConfigProvider>(storage: S, config: &C) -> Self {
        Self {
            storage,
            files: StoreFiles {
                hotels: config.hotels_file().to_string(),
                customers: config.customers_file().to_string(),
                reservations: config.reservations_file().to_string(),
            },
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn files(&self) -> &StoreFiles {
        &self.files
    }

    pub fn load_hotels(&self) -> Result<LoadReport<Hotel>> {
        self.load(&self.files.hotels)
    }

    pub fn save_hotels(&self, hotels: &BTreeMap<String, Hotel>) -> Result<()> {
        self.save(&self.files.hotels, hotels)
    }

    pub fn load_customers(&self) -> Result<LoadReport<Customer>> {
        self.load(&self.files.customers)
    }

    pub fn save_customers(&self, customers: &BTreeMap<String, Customer>) -> Result<()> {
        self.save(&self.files.customers, customers)
    }

    pub fn load_reservations(&self) -> Result<LoadReport<Reservation>> {
        self.load(&self.files.reservations)
    }

    pub fn save_reservations(&self, reservations: &BTreeMap<String, Reservation>) -> Result<()> {
        self.save(&self.files.reservations, reservations)
    }

    pub fn location(&self, path: &str) -> String {
        self.storage.location(path)
    }

    fn load<T: Entity>(&self, path: &str) -> Result<LoadReport<T>> {
        let location = self.storage.location(path);

        let bytes = match self.storage.read_file(path) {
            Ok(bytes) => bytes,
            Err(DeskError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("{} not found, starting with no {} records", location, T::KIND);
                return Ok(LoadReport::default());
            }
            Err(DeskError::IoError(e)) => {
                return Err(DeskError::storage(location, format!("unreadable: {}", e)));
            }
            Err(e) => return Err(e),
        };

        let content = String::from_utf8(bytes)
            .map_err(|e| DeskError::storage(&location, format!("not UTF-8 text: {}", e)))?;
        if content.trim().is_empty() {
            tracing::warn!("{} is empty, treating it as no {} records", location, T::KIND);
            return Ok(LoadReport::default());
        }

        let document: StoreDocument = serde_json::from_str(&content).map_err(|e| {
            let problem = match e.classify() {
                Category::Data => "unexpected layout",
                _ => "invalid JSON",
            };
            DeskError::storage(&location, format!("{}: {}", problem, e))
        })?;

        let mut report = LoadReport::default();
        for (key, raw) in document.0 {
            let outcome = T::from_record(raw)
                .map_err(|e| match e {
                    DeskError::ValidationError { message } => message,
                    other => other.to_string(),
                })
                .and_then(|entity| {
                    if entity.id() != key {
                        Err(format!("record id '{}' does not match its key", entity.id()))
                    } else if report.entities.contains_key(&key) {
                        Err("duplicate identifier".to_string())
                    } else {
                        Ok(entity)
                    }
                });

            match outcome {
                Ok(entity) => {
                    report.entities.insert(key, entity);
                }
                Err(reason) => {
                    tracing::warn!(
                        "Skipping malformed {} '{}' in {}: {}",
                        T::KIND,
                        key,
                        location,
                        reason
                    );
                    report.skipped.push(SkippedRecord { key, reason });
                }
            }
        }

        tracing::debug!(
            "Loaded {} {} record(s) from {} ({} skipped)",
            report.entities.len(),
            T::KIND,
            location,
            report.skipped.len()
        );
        Ok(report)
    }

    fn save<T: Entity>(&self, path: &str, entities: &BTreeMap<String, T>) -> Result<()> {
        let data = serde_json::to_vec_pretty(entities)?;
        self.storage.write_file(path, &data)?;
        tracing::debug!(
            "Saved {} {} record(s) to {}",
            entities.len(),
            T::KIND,
            self.storage.location(path)
        );
        Ok(())
    }
}

/// Raw `(key, record)` pairs of one store, in file order.
///
/// Repeated keys of the object layout are kept so the loader can report them.
/// The legacy array layout is keyed by each record's `id`, or `#index` when
/// it has none.
struct StoreDocument(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for StoreDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(StoreDocumentVisitor)
    }
}

struct StoreDocumentVisitor;

impl<'de> Visitor<'de> for StoreDocumentVisitor {
    type Value = StoreDocument;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an object keyed by id")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<StoreDocument, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::new();
        while let Some((key, record)) = map.next_entry::<String, Value>()? {
            entries.push((key, record));
        }
        Ok(StoreDocument(entries))
    }

    // 舊格式：以陣列儲存
    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<StoreDocument, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut entries = Vec::new();
        while let Some(record) = seq.next_element::<Value>()? {
            let key = record
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("#{}", entries.len()));
            entries.push((key, record));
        }
        Ok(StoreDocument(entries))
    }
}
