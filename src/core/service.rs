use crate::core::repository::{LoadReport, Repository, SkippedRecord};
use crate::domain::model::{
    Customer, CustomerFields, CustomerUpdate, Hotel, HotelFields, HotelUpdate, Reservation,
    ReservedRoom,
};
use crate::domain::ports::{Entity, Storage};
use crate::utils::error::{DeskError, Result};
use crate::utils::validation::{room_available, validate_date_range, validate_range};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What to do when deleting a hotel or customer that Active reservations still point at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    #[default]
    Reject,
    CascadeCancel,
}

/// Result of loading one store, for diagnostics.
#[derive(Debug, Clone)]
pub struct StoreCheck {
    pub kind: &'static str,
    pub location: String,
    pub loaded: usize,
    pub skipped: Vec<SkippedRecord>,
    pub error: Option<String>,
}

/// CRUD and reservation lifecycle over the three stores.
///
/// Every operation reloads the collections it needs, checks references against
/// what is currently stored, mutates in memory and writes the changed
/// collections back. Availability is always computed from Active reservations;
/// each hotel's `reserved_rooms` list is a snapshot rewritten from them.
#[derive(Debug)]
pub struct ReservationService<S: Storage> {
    repository: Repository<S>,
    delete_policy: DeletePolicy,
}

impl<S: Storage> ReservationService<S> {
    pub fn new(repository: Repository<S>, delete_policy: DeletePolicy) -> Self {
        Self {
            repository,
            delete_policy,
        }
    }

    pub fn repository(&self) -> &Repository<S> {
        &self.repository
    }

    pub fn delete_policy(&self) -> DeletePolicy {
        self.delete_policy
    }

    // ---- hotels ----

    pub fn create_hotel(&self, fields: HotelFields) -> Result<Hotel> {
        let hotel = Hotel::new(fields)?;
        let mut hotels = self.repository.load_hotels()?.entities;
        if hotels.contains_key(hotel.id()) {
            return Err(DeskError::validation(format!(
                "hotel '{}' already exists",
                hotel.id()
            )));
        }

        hotels.insert(hotel.id().to_string(), hotel.clone());
        self.repository.save_hotels(&hotels)?;
        tracing::info!("Created hotel {} ({} rooms)", hotel.id(), hotel.total_rooms());
        Ok(hotel)
    }

    pub fn update_hotel(&self, id: &str, update: HotelUpdate) -> Result<Hotel> {
        let mut hotels = self.repository.load_hotels()?.entities;
        let reservations = self.repository.load_reservations()?.entities;

        let hotel = hotels
            .get_mut(id)
            .ok_or_else(|| DeskError::not_found(Hotel::KIND, id))?;
        // 以目前的有效訂房為準，再檢查房數是否可縮減
        let rooms = active_rooms(hotel, &reservations);
        hotel.set_reserved_rooms(rooms)?;
        hotel.apply(update)?;
        let updated = hotel.clone();

        self.repository.save_hotels(&hotels)?;
        tracing::info!("Updated hotel {}", id);
        Ok(updated)
    }

    pub fn delete_hotel(&self, id: &str) -> Result<()> {
        let mut hotels = self.repository.load_hotels()?.entities;
        if !hotels.contains_key(id) {
            return Err(DeskError::not_found(Hotel::KIND, id));
        }

        let mut reservations = self.repository.load_reservations()?.entities;
        let blocking = active_reservation_ids(&reservations, |r| r.hotel_id() == id);
        if !blocking.is_empty() {
            self.release_blocking(Hotel::KIND, id, &blocking, &mut reservations)?;
            self.repository.save_reservations(&reservations)?;
        }

        hotels.remove(id);
        self.repository.save_hotels(&hotels)?;
        tracing::info!("Deleted hotel {}", id);
        Ok(())
    }

    pub fn show_hotel(&self, id: &str) -> Result<Hotel> {
        self.repository
            .load_hotels()?
            .entities
            .remove(id)
            .ok_or_else(|| DeskError::not_found(Hotel::KIND, id))
    }

    pub fn list_hotels(&self) -> Result<Vec<Hotel>> {
        Ok(self.repository.load_hotels()?.entities.into_values().collect())
    }

    /// Room numbers of `hotel_id` free for the whole `[start, end)` range.
    pub fn available_rooms(&self, hotel_id: &str, start: &str, end: &str) -> Result<Vec<u32>> {
        let hotel = self.show_hotel(hotel_id)?;
        let (start_date, end_date) = validate_date_range(start, end)?;
        let reservations = self.repository.load_reservations()?.entities;

        Ok((1..=hotel.total_rooms())
            .filter(|&room| {
                room_available(&hotel, room, start_date, end_date, reservations.values(), None)
            })
            .collect())
    }

    // ---- customers ----

    pub fn create_customer(&self, fields: CustomerFields) -> Result<Customer> {
        let customer = Customer::new(fields)?;
        let mut customers = self.repository.load_customers()?.entities;
        if customers.contains_key(customer.id()) {
            return Err(DeskError::validation(format!(
                "customer '{}' already exists",
                customer.id()
            )));
        }

        customers.insert(customer.id().to_string(), customer.clone());
        self.repository.save_customers(&customers)?;
        tracing::info!("Created customer {}", customer.id());
        Ok(customer)
    }

    pub fn update_customer(&self, id: &str, update: CustomerUpdate) -> Result<Customer> {
        let mut customers = self.repository.load_customers()?.entities;
        let customer = customers
            .get_mut(id)
            .ok_or_else(|| DeskError::not_found(Customer::KIND, id))?;
        customer.apply(update)?;
        let updated = customer.clone();

        self.repository.save_customers(&customers)?;
        tracing::info!("Updated customer {}", id);
        Ok(updated)
    }

    pub fn delete_customer(&self, id: &str) -> Result<()> {
        let mut customers = self.repository.load_customers()?.entities;
        if !customers.contains_key(id) {
            return Err(DeskError::not_found(Customer::KIND, id));
        }

        let mut reservations = self.repository.load_reservations()?.entities;
        let blocking = active_reservation_ids(&reservations, |r| r.customer_id() == id);
        if !blocking.is_empty() {
            self.release_blocking(Customer::KIND, id, &blocking, &mut reservations)?;
            self.commit_reservations(&reservations)?;
        }

        customers.remove(id);
        self.repository.save_customers(&customers)?;
        tracing::info!("Deleted customer {}", id);
        Ok(())
    }

    pub fn show_customer(&self, id: &str) -> Result<Customer> {
        self.repository
            .load_customers()?
            .entities
            .remove(id)
            .ok_or_else(|| DeskError::not_found(Customer::KIND, id))
    }

    pub fn list_customers(&self) -> Result<Vec<Customer>> {
        Ok(self.repository.load_customers()?.entities.into_values().collect())
    }

    // ---- reservations ----

    pub fn create_reservation(
        &self,
        customer_id: &str,
        hotel_id: &str,
        room_number: u32,
        start: &str,
        end: &str,
    ) -> Result<Reservation> {
        let customers = self.repository.load_customers()?.entities;
        let hotels = self.repository.load_hotels()?.entities;
        let mut reservations = self.repository.load_reservations()?.entities;

        if !customers.contains_key(customer_id) {
            return Err(DeskError::not_found(Customer::KIND, customer_id));
        }
        let hotel = hotels
            .get(hotel_id)
            .ok_or_else(|| DeskError::not_found(Hotel::KIND, hotel_id))?;

        let (start_date, end_date) = validate_date_range(start, end)?;
        validate_range("room_number", room_number, 1, hotel.total_rooms())?;

        if !room_available(hotel, room_number, start_date, end_date, reservations.values(), None) {
            return Err(DeskError::conflict(format!(
                "room {} of hotel '{}' is already booked between {} and {}",
                room_number, hotel_id, start_date, end_date
            )));
        }

        let id = next_reservation_id(&reservations)?;
        let reservation =
            Reservation::new(&id, customer_id, hotel_id, room_number, start_date, end_date)?;
        reservations.insert(id, reservation.clone());

        self.commit_reservations(&reservations)?;
        tracing::info!(
            "Created reservation {} for {} at {} room {} ({} to {})",
            reservation.id(),
            customer_id,
            hotel_id,
            room_number,
            start_date,
            end_date
        );
        Ok(reservation)
    }

    /// Cancels a reservation. Cancelling an already Cancelled one succeeds without writing.
    pub fn cancel_reservation(&self, id: &str) -> Result<Reservation> {
        let mut reservations = self.repository.load_reservations()?.entities;
        let reservation = reservations
            .get_mut(id)
            .ok_or_else(|| DeskError::not_found(Reservation::KIND, id))?;

        if !reservation.cancel() {
            tracing::info!("Reservation {} was already cancelled", id);
            return Ok(reservation.clone());
        }
        let cancelled = reservation.clone();

        self.commit_reservations(&reservations)?;
        tracing::info!(
            "Cancelled reservation {}, room {} of {} released",
            id,
            cancelled.room_number(),
            cancelled.hotel_id()
        );
        Ok(cancelled)
    }

    /// Moves an Active reservation to another room or date range of the same hotel.
    pub fn update_reservation(
        &self,
        id: &str,
        room_number: u32,
        start: &str,
        end: &str,
    ) -> Result<Reservation> {
        let hotels = self.repository.load_hotels()?.entities;
        let mut reservations = self.repository.load_reservations()?.entities;

        let current = reservations
            .get(id)
            .ok_or_else(|| DeskError::not_found(Reservation::KIND, id))?;
        if !current.is_active() {
            return Err(DeskError::conflict(format!(
                "reservation '{}' is cancelled and cannot be changed",
                id
            )));
        }
        let hotel = hotels
            .get(current.hotel_id())
            .ok_or_else(|| DeskError::not_found(Hotel::KIND, current.hotel_id()))?;

        let (start_date, end_date) = validate_date_range(start, end)?;
        validate_range("room_number", room_number, 1, hotel.total_rooms())?;

        let others = reservations.values();
        if !room_available(hotel, room_number, start_date, end_date, others, Some(id)) {
            return Err(DeskError::conflict(format!(
                "room {} of hotel '{}' is already booked between {} and {}",
                room_number,
                hotel.id(),
                start_date,
                end_date
            )));
        }

        let updated = match reservations.get_mut(id) {
            Some(reservation) => {
                reservation.reschedule(room_number, start_date, end_date)?;
                reservation.clone()
            }
            None => return Err(DeskError::not_found(Reservation::KIND, id)),
        };

        self.commit_reservations(&reservations)?;
        tracing::info!("Updated reservation {}", id);
        Ok(updated)
    }

    pub fn show_reservation(&self, id: &str) -> Result<Reservation> {
        self.repository
            .load_reservations()?
            .entities
            .remove(id)
            .ok_or_else(|| DeskError::not_found(Reservation::KIND, id))
    }

    pub fn list_reservations(&self) -> Result<Vec<Reservation>> {
        Ok(self
            .repository
            .load_reservations()?
            .entities
            .into_values()
            .collect())
    }

    /// Loads every store and reports what was skipped. Never fails.
    pub fn check_stores(&self) -> Vec<StoreCheck> {
        let files = self.repository.files();
        vec![
            self.check_store(Hotel::KIND, &files.hotels, self.repository.load_hotels()),
            self.check_store(Customer::KIND, &files.customers, self.repository.load_customers()),
            self.check_store(
                Reservation::KIND,
                &files.reservations,
                self.repository.load_reservations(),
            ),
        ]
    }

    fn check_store<T>(
        &self,
        kind: &'static str,
        path: &str,
        loaded: Result<LoadReport<T>>,
    ) -> StoreCheck {
        let location = self.repository.location(path);
        match loaded {
            Ok(report) => StoreCheck {
                kind,
                location,
                loaded: report.entities.len(),
                skipped: report.skipped,
                error: None,
            },
            Err(e) => StoreCheck {
                kind,
                location,
                loaded: 0,
                skipped: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }

    /// Applies the delete policy to Active reservations blocking removal of `owner_id`.
    fn release_blocking(
        &self,
        owner_kind: &str,
        owner_id: &str,
        blocking: &[String],
        reservations: &mut BTreeMap<String, Reservation>,
    ) -> Result<()> {
        match self.delete_policy {
            DeletePolicy::Reject => Err(DeskError::conflict(format!(
                "{} '{}' still has {} active reservation(s): {}",
                owner_kind,
                owner_id,
                blocking.len(),
                blocking.join(", ")
            ))),
            DeletePolicy::CascadeCancel => {
                for reservation_id in blocking {
                    if let Some(reservation) = reservations.get_mut(reservation_id) {
                        reservation.cancel();
                    }
                }
                tracing::warn!(
                    "Cancelled {} reservation(s) of {} '{}' before deleting it: {}",
                    blocking.len(),
                    owner_kind,
                    owner_id,
                    blocking.join(", ")
                );
                Ok(())
            }
        }
    }

    /// Saves `reservations` together with the hotels' reserved-room snapshots.
    ///
    /// The hotel store is loaded and every snapshot rebuilt before anything is
    /// written, so a hotel store that cannot be read fails the operation with
    /// nothing saved.
    fn commit_reservations(&self, reservations: &BTreeMap<String, Reservation>) -> Result<()> {
        let mut hotels = self.repository.load_hotels()?.entities;
        let mut changed = false;

        for hotel in hotels.values_mut() {
            let rooms = active_rooms(hotel, reservations);
            if rooms.as_slice() != hotel.reserved_rooms() {
                hotel.set_reserved_rooms(rooms)?;
                changed = true;
            }
        }

        self.repository.save_reservations(reservations)?;
        if changed {
            self.repository.save_hotels(&hotels)?;
        }
        Ok(())
    }
}

/// Active reservations of `hotel` whose room lies inside the hotel's range, sorted.
fn active_rooms(hotel: &Hotel, reservations: &BTreeMap<String, Reservation>) -> Vec<ReservedRoom> {
    let mut rooms: Vec<ReservedRoom> = reservations
        .values()
        .filter(|r| r.is_active() && r.hotel_id() == hotel.id())
        .filter(|r| {
            let in_range = r.room_number() <= hotel.total_rooms();
            if !in_range {
                tracing::warn!(
                    "Reservation {} holds room {} but hotel {} has only {} rooms",
                    r.id(),
                    r.room_number(),
                    hotel.id(),
                    hotel.total_rooms()
                );
            }
            in_range
        })
        .map(Reservation::reserved_room)
        .collect();
    rooms.sort();
    rooms
}

fn active_reservation_ids<F>(
    reservations: &BTreeMap<String, Reservation>,
    belongs: F,
) -> Vec<String>
where
    F: Fn(&Reservation) -> bool,
{
    reservations
        .values()
        .filter(|r| r.is_active() && belongs(r))
        .map(|r| r.id().to_string())
        .collect()
}

/// `R` followed by one more than the highest numeric suffix in use, at least three digits.
///
/// When the highest suffix is already `u64::MAX` the first free number from 1 is used.
fn next_reservation_id(reservations: &BTreeMap<String, Reservation>) -> Result<String> {
    let highest = reservations
        .keys()
        .filter_map(|id| id.strip_prefix('R'))
        .filter_map(|digits| digits.parse::<u64>().ok())
        .max()
        .unwrap_or(0);

    let first = highest.checked_add(1).unwrap_or(1);
    (first..=u64::MAX)
        .chain(1..first)
        .map(|n| format!("R{:03}", n))
        .find(|candidate| !reservations.contains_key(candidate))
        .ok_or_else(|| DeskError::conflict("no reservation identifier left"))
}
