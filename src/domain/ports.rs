use crate::utils::error::{DeskError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Byte-level access to the durable stores. Missing files surface as
/// `IoError` with `ErrorKind::NotFound`.
pub trait Storage {
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;

    /// Replaces `path` as a whole; readers never see a partially written file.
    fn write_file(&self, path: &str, data: &[u8]) -> Result<()>;

    fn location(&self, path: &str) -> String {
        path.to_string()
    }
}

/// A record kept in one store, keyed by its identifier.
pub trait Entity: Serialize + DeserializeOwned + Clone {
    const KIND: &'static str;

    fn id(&self) -> &str;

    /// Builds the entity from one stored record. A missing field, a wrong
    /// type or a failed field check is a `ValidationError`.
    fn from_record(record: Value) -> Result<Self> {
        serde_json::from_value(record).map_err(|e| DeskError::validation(e.to_string()))
    }
}

/// Where each collection lives inside a `Storage`.
pub trait ConfigProvider {
    fn hotels_file(&self) -> &str;
    fn customers_file(&self) -> &str;
    fn reservations_file(&self) -> &str;
}
