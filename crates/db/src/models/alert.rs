//! Alert rows and query filters.

use serde::Serialize;
use sqlx::FromRow;
use vitrine_core::alert::AlertStatus;
use vitrine_core::quantity::Quantity;
use vitrine_core::types::{DbId, Timestamp};

/// A persisted threshold breach.
///
/// `quantity`, `direction` and `status` hold the canonical strings from
/// [`vitrine_core::quantity`] and [`vitrine_core::alert`].
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Alert {
    pub id: DbId,
    pub artifact_id: DbId,
    pub device_id: DbId,
    pub reading_id: DbId,
    pub quantity: String,
    pub direction: String,
    pub measured_value: f64,
    pub threshold_value: f64,
    pub status: String,
    pub detected_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
    pub dismissed_at: Option<Timestamp>,
}

impl Alert {
    pub fn is_active(&self) -> bool {
        self.status == AlertStatus::Active.as_str()
    }
}

/// Optional filters for listing alerts. Unset fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub artifact_id: Option<DbId>,
    pub device_id: Option<DbId>,
    pub status: Option<AlertStatus>,
    pub quantity: Option<Quantity>,
    /// Maximum rows to return; clamped by the repository.
    pub limit: Option<i64>,
}
