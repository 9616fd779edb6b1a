//! Periodic data collection from the device cloud.
//!
//! A [`CollectionScheduler`] drives at most one collection run at a time.
//! A run polls every linked device at a fixed interval for a fixed amount
//! of running time, feeding each sample into ingestion.

pub mod scheduler;
pub mod sources;
pub mod status;

pub use scheduler::CollectionScheduler;
pub use sources::{PollTarget, PollTargets, ReadingSink, RegistryTargets};
pub use status::{CollectionStatus, RunStatus};
