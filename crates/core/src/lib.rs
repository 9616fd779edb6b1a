//! Vitrine domain core.
//!
//! Pure logic shared by the database, pipeline, collector and API crates.
//! Nothing in here touches the database or the network.

pub mod alert;
pub mod device_status;
pub mod error;
pub mod quantity;
pub mod reading;
pub mod threshold_validation;
pub mod thresholds;
pub mod types;
