pub mod repository;
pub mod service;

pub use crate::domain::model::{Customer, Hotel, Reservation, ReservationStatus};
pub use crate::domain::ports::{ConfigProvider, Entity, Storage};
pub use crate::utils::error::Result;
