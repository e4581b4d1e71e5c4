pub mod adapters;
#[cfg(feature = "cli")]
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::storage::{LocalStorage, MemoryStorage};
pub use config::AppConfig;
pub use crate::core::{
    repository::{LoadReport, Repository, SkippedRecord, StoreFiles},
    service::{DeletePolicy, ReservationService},
};
pub use domain::model::{
    Customer, CustomerFields, CustomerUpdate, Hotel, HotelFields, HotelUpdate, Reservation,
    ReservationStatus, ReservedRoom,
};
pub use utils::error::{DeskError, Result};
