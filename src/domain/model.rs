use crate::domain::ports::Entity;
use crate::utils::error::{DeskError, Result};
use crate::utils::validation::{
    ensure_ordered, validate_date_range, validate_identifier, validate_non_empty_string,
    validate_positive_number,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A room held by an Active reservation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReservedRoom {
    pub room_number: u32,
    pub reservation_id: String,
}

/// Input for creating a hotel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotelFields {
    pub id: String,
    pub name: String,
    pub address: String,
    pub total_rooms: u32,
}

/// Partial update of a hotel; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HotelUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub total_rooms: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HotelRecord")]
pub struct Hotel {
    id: String,
    name: String,
    address: String,
    total_rooms: u32,
    reserved_rooms: Vec<ReservedRoom>,
}

// 檔案中的原始欄位，經 TryFrom 驗證後才成為 Hotel
#[derive(Debug, Deserialize)]
struct HotelRecord {
    id: String,
    name: String,
    address: String,
    total_rooms: u32,
    #[serde(default)]
    reserved_rooms: Vec<ReservedRoom>,
}

impl Hotel {
    pub fn new(fields: HotelFields) -> Result<Self> {
        validate_hotel_fields(&fields)?;
        Ok(Self {
            id: fields.id,
            name: fields.name,
            address: fields.address,
            total_rooms: fields.total_rooms,
            reserved_rooms: Vec::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn total_rooms(&self) -> u32 {
        self.total_rooms
    }

    pub fn reserved_rooms(&self) -> &[ReservedRoom] {
        &self.reserved_rooms
    }

    pub fn fields(&self) -> HotelFields {
        HotelFields {
            id: self.id.clone(),
            name: self.name.clone(),
            address: self.address.clone(),
            total_rooms: self.total_rooms,
        }
    }

    /// Applies `update` atomically: on error the hotel is left unchanged.
    ///
    /// Shrinking `total_rooms` below a currently reserved room number is a
    /// conflict rather than a validation failure.
    pub fn apply(&mut self, update: HotelUpdate) -> Result<()> {
        let mut fields = self.fields();
        if let Some(name) = update.name {
            fields.name = name;
        }
        if let Some(address) = update.address {
            fields.address = address;
        }
        if let Some(total_rooms) = update.total_rooms {
            fields.total_rooms = total_rooms;
        }
        validate_hotel_fields(&fields)?;

        if let Some(highest) = self.reserved_rooms.iter().map(|r| r.room_number).max() {
            if highest > fields.total_rooms {
                return Err(DeskError::conflict(format!(
                    "hotel '{}' cannot shrink to {} rooms while room {} is reserved",
                    self.id, fields.total_rooms, highest
                )));
            }
        }

        self.name = fields.name;
        self.address = fields.address;
        self.total_rooms = fields.total_rooms;
        Ok(())
    }

    /// Replaces the reserved-room snapshot after checking it against the room range.
    pub fn set_reserved_rooms(&mut self, mut reserved_rooms: Vec<ReservedRoom>) -> Result<()> {
        reserved_rooms.sort();
        validate_reserved_rooms(&self.id, self.total_rooms, &reserved_rooms)?;
        self.reserved_rooms = reserved_rooms;
        Ok(())
    }
}

impl TryFrom<HotelRecord> for Hotel {
    type Error = String;

    fn try_from(record: HotelRecord) -> std::result::Result<Self, String> {
        let mut hotel = Hotel::new(HotelFields {
            id: record.id,
            name: record.name,
            address: record.address,
            total_rooms: record.total_rooms,
        })
        .map_err(rejection)?;
        hotel
            .set_reserved_rooms(record.reserved_rooms)
            .map_err(rejection)?;
        Ok(hotel)
    }
}

impl Entity for Hotel {
    const KIND: &'static str = "hotel";

    fn id(&self) -> &str {
        &self.id
    }
}

fn validate_hotel_fields(fields: &HotelFields) -> Result<()> {
    validate_identifier("hotel id", &fields.id)?;
    validate_non_empty_string("hotel name", &fields.name)?;
    validate_non_empty_string("hotel address", &fields.address)?;
    validate_positive_number("total_rooms", fields.total_rooms, 1)?;
    Ok(())
}

fn validate_reserved_rooms(hotel_id: &str, total_rooms: u32, rooms: &[ReservedRoom]) -> Result<()> {
    let mut seen_reservations = HashSet::new();

    for room in rooms {
        validate_identifier("reserved room reservation_id", &room.reservation_id)?;
        if room.room_number < 1 || room.room_number > total_rooms {
            return Err(DeskError::validation(format!(
                "hotel '{}' reserves room {} outside 1..={}",
                hotel_id, room.room_number, total_rooms
            )));
        }
        if !seen_reservations.insert(room.reservation_id.as_str()) {
            return Err(DeskError::validation(format!(
                "hotel '{}' lists reservation '{}' more than once",
                hotel_id, room.reservation_id
            )));
        }
    }

    Ok(())
}

/// Input for creating a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerFields {
    pub id: String,
    pub name: String,
    pub contact: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub contact: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CustomerRecord")]
pub struct Customer {
    id: String,
    name: String,
    contact: String,
}

#[derive(Debug, Deserialize)]
struct CustomerRecord {
    id: String,
    name: String,
    contact: String,
}

impl Customer {
    pub fn new(fields: CustomerFields) -> Result<Self> {
        validate_customer_fields(&fields)?;
        Ok(Self {
            id: fields.id,
            name: fields.name,
            contact: fields.contact,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contact(&self) -> &str {
        &self.contact
    }

    pub fn fields(&self) -> CustomerFields {
        CustomerFields {
            id: self.id.clone(),
            name: self.name.clone(),
            contact: self.contact.clone(),
        }
    }

    pub fn apply(&mut self, update: CustomerUpdate) -> Result<()> {
        let mut fields = self.fields();
        if let Some(name) = update.name {
            fields.name = name;
        }
        if let Some(contact) = update.contact {
            fields.contact = contact;
        }
        validate_customer_fields(&fields)?;

        self.name = fields.name;
        self.contact = fields.contact;
        Ok(())
    }
}

impl TryFrom<CustomerRecord> for Customer {
    type Error = String;

    fn try_from(record: CustomerRecord) -> std::result::Result<Self, String> {
        Customer::new(CustomerFields {
            id: record.id,
            name: record.name,
            contact: record.contact,
        })
        .map_err(rejection)
    }
}

impl Entity for Customer {
    const KIND: &'static str = "customer";

    fn id(&self) -> &str {
        &self.id
    }
}

fn validate_customer_fields(fields: &CustomerFields) -> Result<()> {
    validate_identifier("customer id", &fields.id)?;
    validate_non_empty_string("customer name", &fields.name)?;
    validate_non_empty_string("customer contact", &fields.contact)?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    #[default]
    #[serde(alias = "ACTIVE")]
    Active,
    #[serde(alias = "CANCELLED")]
    Cancelled,
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ReservationRecord")]
pub struct Reservation {
    id: String,
    customer_id: String,
    hotel_id: String,
    room_number: u32,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: ReservationStatus,
}

#[derive(Debug, Deserialize)]
struct ReservationRecord {
    id: String,
    customer_id: String,
    hotel_id: String,
    room_number: u32,
    start_date: String,
    end_date: String,
    #[serde(default)]
    status: ReservationStatus,
}

impl Reservation {
    /// Creates an Active reservation. Cross-entity checks (existing hotel and
    /// customer, room range, availability) belong to the service.
    pub fn new(
        id: &str,
        customer_id: &str,
        hotel_id: &str,
        room_number: u32,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self> {
        validate_identifier("reservation id", id)?;
        validate_identifier("customer_id", customer_id)?;
        validate_identifier("hotel_id", hotel_id)?;
        validate_positive_number("room_number", room_number, 1)?;
        ensure_ordered(start_date, end_date)?;

        Ok(Self {
            id: id.to_string(),
            customer_id: customer_id.to_string(),
            hotel_id: hotel_id.to_string(),
            room_number,
            start_date,
            end_date,
            status: ReservationStatus::Active,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn hotel_id(&self) -> &str {
        &self.hotel_id
    }

    pub fn room_number(&self) -> u32 {
        self.room_number
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Active
    }

    /// Moves an Active reservation to Cancelled. Returns `false` when it was
    /// already Cancelled; there is no way back to Active.
    pub fn cancel(&mut self) -> bool {
        if self.is_active() {
            self.status = ReservationStatus::Cancelled;
            true
        } else {
            false
        }
    }

    /// Changes room and dates of an Active reservation. Availability is the caller's job.
    pub fn reschedule(
        &mut self,
        room_number: u32,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<()> {
        if !self.is_active() {
            return Err(DeskError::conflict(format!(
                "reservation '{}' is cancelled and cannot be changed",
                self.id
            )));
        }
        validate_positive_number("room_number", room_number, 1)?;
        ensure_ordered(start_date, end_date)?;

        self.room_number = room_number;
        self.start_date = start_date;
        self.end_date = end_date;
        Ok(())
    }

    pub fn reserved_room(&self) -> ReservedRoom {
        ReservedRoom {
            room_number: self.room_number,
            reservation_id: self.id.clone(),
        }
    }
}

impl TryFrom<ReservationRecord> for Reservation {
    type Error = String;

    fn try_from(record: ReservationRecord) -> std::result::Result<Self, String> {
        let (start_date, end_date) =
            validate_date_range(&record.start_date, &record.end_date).map_err(rejection)?;
        let mut reservation = Reservation::new(
            &record.id,
            &record.customer_id,
            &record.hotel_id,
            record.room_number,
            start_date,
            end_date,
        )
        .map_err(rejection)?;
        reservation.status = record.status;
        Ok(reservation)
    }
}

impl Entity for Reservation {
    const KIND: &'static str = "reservation";

    fn id(&self) -> &str {
        &self.id
    }
}

// 驗證錯誤只保留訊息本文，交由 serde 帶出
fn rejection(error: DeskError) -> String {
    match error {
        DeskError::ValidationError { message } => message,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ErrorCategory;
    use serde_json::json;

    fn hotel_fields() -> HotelFields {
        HotelFields {
            id: "H001".to_string(),
            name: "Test Hotel".to_string(),
            address: "Av. Juárez 100, Chihuahua".to_string(),
            total_rooms: 3,
        }
    }

    #[test]
    fn test_hotel_rejects_bad_fields() {
        let mut fields = hotel_fields();
        fields.total_rooms = 0;
        assert!(matches!(Hotel::new(fields), Err(DeskError::ValidationError { .. })));

        let mut fields = hotel_fields();
        fields.name = "  ".to_string();
        assert!(Hotel::new(fields).is_err());

        let mut fields = hotel_fields();
        fields.id = String::new();
        assert!(Hotel::new(fields).is_err());
    }

    #[test]
    fn test_hotel_json_shape() {
        let hotel = Hotel::new(hotel_fields()).unwrap();
        let value = serde_json::to_value(&hotel).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "H001",
                "name": "Test Hotel",
                "address": "Av. Juárez 100, Chihuahua",
                "total_rooms": 3,
                "reserved_rooms": []
            })
        );
    }

    #[test]
    fn test_hotel_deserialize_validates() {
        let negative = json!({"id": "H1", "name": "X", "address": "Y", "total_rooms": -1});
        assert!(serde_json::from_value::<Hotel>(negative).is_err());

        let missing = json!({"id": "H1", "name": "X", "total_rooms": 2});
        assert!(serde_json::from_value::<Hotel>(missing).is_err());

        let out_of_range = json!({
            "id": "H1", "name": "X", "address": "Y", "total_rooms": 2,
            "reserved_rooms": [{"room_number": 3, "reservation_id": "R001"}]
        });
        assert!(serde_json::from_value::<Hotel>(out_of_range).is_err());

        let duplicate = json!({
            "id": "H1", "name": "X", "address": "Y", "total_rooms": 2,
            "reserved_rooms": [
                {"room_number": 1, "reservation_id": "R001"},
                {"room_number": 2, "reservation_id": "R001"}
            ]
        });
        assert!(serde_json::from_value::<Hotel>(duplicate).is_err());
    }

    #[test]
    fn test_from_record_reports_validation_errors() {
        let missing = json!({"id": "H1", "name": "X", "total_rooms": 2});
        match Hotel::from_record(missing) {
            Err(e @ DeskError::ValidationError { .. }) => {
                assert!(e.to_string().contains("missing field `address`"));
                assert_eq!(e.category(), ErrorCategory::Input);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let wrong_type = json!({"id": "C1", "name": "Uno", "contact": 5});
        assert!(matches!(
            Customer::from_record(wrong_type),
            Err(DeskError::ValidationError { .. })
        ));

        let reversed = json!({
            "id": "R001", "customer_id": "C1", "hotel_id": "H1", "room_number": 1,
            "start_date": "2024-01-05", "end_date": "2024-01-01"
        });
        match Reservation::from_record(reversed) {
            Err(DeskError::ValidationError { message }) => {
                assert!(!message.starts_with("Validation error"));
                assert!(message.contains("before end_date"));
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let valid = json!({"id": "C1", "name": "Uno", "contact": "uno@example.com"});
        assert_eq!(Customer::from_record(valid).unwrap().name(), "Uno");
    }

    #[test]
    fn test_hotel_apply_is_atomic() {
        let mut hotel = Hotel::new(hotel_fields()).unwrap();
        hotel
            .set_reserved_rooms(vec![ReservedRoom {
                room_number: 3,
                reservation_id: "R001".to_string(),
            }])
            .unwrap();

        let result = hotel.apply(HotelUpdate {
            name: Some("Renamed".to_string()),
            total_rooms: Some(2),
            ..Default::default()
        });
        assert!(matches!(result, Err(DeskError::ConflictError { .. })));
        assert_eq!(hotel.name(), "Test Hotel");
        assert_eq!(hotel.total_rooms(), 3);

        hotel
            .apply(HotelUpdate {
                total_rooms: Some(5),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(hotel.total_rooms(), 5);
    }

    #[test]
    fn test_customer_update_validates() {
        let mut customer = Customer::new(CustomerFields {
            id: "C001".to_string(),
            name: "Cliente Uno".to_string(),
            contact: "c1@example.com".to_string(),
        })
        .unwrap();

        assert!(customer
            .apply(CustomerUpdate {
                contact: Some(String::new()),
                ..Default::default()
            })
            .is_err());
        assert_eq!(customer.contact(), "c1@example.com");
    }

    #[test]
    fn test_reservation_record_parsing() {
        let value = json!({
            "id": "R001",
            "customer_id": "C001",
            "hotel_id": "H001",
            "room_number": 1,
            "start_date": "2024-01-01",
            "end_date": "2024-01-05",
            "status": "ACTIVE"
        });
        let reservation: Reservation = serde_json::from_value(value).unwrap();
        assert!(reservation.is_active());

        let written = serde_json::to_value(&reservation).unwrap();
        assert_eq!(written["status"], "active");
        assert_eq!(written["start_date"], "2024-01-01");
    }

    #[test]
    fn test_reservation_record_rejects_bad_values() {
        let base = json!({
            "id": "R001",
            "customer_id": "C001",
            "hotel_id": "H001",
            "room_number": 1,
            "start_date": "2024-01-05",
            "end_date": "2024-01-05",
            "status": "active"
        });
        assert!(serde_json::from_value::<Reservation>(base.clone()).is_err());

        let mut pending = base.clone();
        pending["end_date"] = json!("2024-01-06");
        pending["status"] = json!("pending");
        assert!(serde_json::from_value::<Reservation>(pending).is_err());

        let mut no_date = base;
        no_date["start_date"] = json!("not-a-date");
        assert!(serde_json::from_value::<Reservation>(no_date).is_err());
    }

    #[test]
    fn test_cancel_is_terminal() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let mut reservation = Reservation::new("R001", "C001", "H001", 1, start, end).unwrap();

        assert!(reservation.cancel());
        assert!(!reservation.cancel());
        assert_eq!(reservation.status(), ReservationStatus::Cancelled);
        assert!(matches!(
            reservation.reschedule(2, start, end),
            Err(DeskError::ConflictError { .. })
        ));
    }
}
