use crate::domain::model::{Hotel, Reservation};
use crate::utils::error::{DeskError, Result};
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_identifier(field_name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(DeskError::validation(format!("{} cannot be empty", field_name)));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(DeskError::validation(format!(
            "{} '{}' must not contain whitespace",
            field_name, value
        )));
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DeskError::validation(format!(
            "{} cannot be empty or whitespace-only",
            field_name
        )));
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u32, min_value: u32) -> Result<()> {
    if value < min_value {
        return Err(DeskError::validation(format!(
            "{} must be at least {} (got {})",
            field_name, min_value, value
        )));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(DeskError::validation(format!(
            "{} must be between {} and {} (got {})",
            field_name, min, max, value
        )));
    }
    Ok(())
}

pub fn parse_date(field_name: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
        DeskError::validation(format!(
            "{} '{}' is not a valid YYYY-MM-DD date: {}",
            field_name, value, e
        ))
    })
}

/// Parses both ends of a stay and checks that check-in comes strictly before check-out.
pub fn validate_date_range(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate)> {
    let start_date = parse_date("start_date", start)?;
    let end_date = parse_date("end_date", end)?;
    ensure_ordered(start_date, end_date)?;
    Ok((start_date, end_date))
}

pub fn ensure_ordered(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start >= end {
        return Err(DeskError::validation(format!(
            "start_date {} must be before end_date {}",
            start, end
        )));
    }
    Ok(())
}

/// Half-open overlap: the check-out day of one stay may be the check-in day of the next.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Whether `room_number` of `hotel` is free for `[start, end)`.
///
/// Only Active reservations of the same hotel and room block the range. The
/// reservation named by `excluding_id` is ignored so that an existing stay can
/// be re-checked against everyone else. An out-of-range room is simply not
/// available; this never fails.
pub fn room_available<'a, I>(
    hotel: &Hotel,
    room_number: u32,
    start: NaiveDate,
    end: NaiveDate,
    existing_reservations: I,
    excluding_id: Option<&str>,
) -> bool
where
    I: IntoIterator<Item = &'a Reservation>,
{
    if room_number < 1 || room_number > hotel.total_rooms() {
        return false;
    }

    !existing_reservations.into_iter().any(|other| {
        other.is_active()
            && other.hotel_id() == hotel.id()
            && other.room_number() == room_number
            && excluding_id != Some(other.id())
            && ranges_overlap(start, end, other.start_date(), other.end_date())
    })
}
