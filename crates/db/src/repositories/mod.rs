//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod alert_repo;
pub mod artifact_repo;
pub mod device_repo;
pub mod material_repo;
pub mod reading_repo;

pub use alert_repo::AlertRepo;
pub use artifact_repo::ArtifactRepo;
pub use device_repo::DeviceRepo;
pub use material_repo::MaterialRepo;
pub use reading_repo::{PurgeSummary, ReadingRepo};

/// Default row cap for list queries.
pub const DEFAULT_LIMIT: i64 = 100;

/// Hard row cap for list queries.
pub const MAX_LIMIT: i64 = 1000;

/// Clamp a caller-supplied limit into `1..=MAX_LIMIT`.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}
