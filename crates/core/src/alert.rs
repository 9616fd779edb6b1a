//! Alert lifecycle types and the transient breach descriptor.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::quantity::Quantity;
use crate::types::{DbId, Timestamp};

/// Status value stored for an alert that is still open.
pub const STATUS_ACTIVE: &str = "active";

/// Status value stored for an alert a user has dismissed.
pub const STATUS_DISMISSED: &str = "dismissed";

/// Lifecycle status of a persisted alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Dismissed,
}

impl AlertStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertStatus::Active => STATUS_ACTIVE,
            AlertStatus::Dismissed => STATUS_DISMISSED,
        }
    }

    /// Parse a requested status. Anything outside `{active, dismissed}` is
    /// rejected with [`CoreError::InvalidStatus`].
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            STATUS_ACTIVE => Ok(AlertStatus::Active),
            STATUS_DISMISSED => Ok(AlertStatus::Dismissed),
            other => Err(CoreError::InvalidStatus(format!(
                "status must be '{STATUS_ACTIVE}' or '{STATUS_DISMISSED}', got '{other}'"
            ))),
        }
    }
}

/// Which bound a measured value crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreachDirection {
    /// Value exceeded the upper bound.
    Upper,
    /// Value fell below the lower bound.
    Lower,
}

impl BreachDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            BreachDirection::Upper => "upper",
            BreachDirection::Lower => "lower",
        }
    }
}

/// A single threshold breach produced by the evaluator.
///
/// Never stored as-is: the alert store either matches it to an existing
/// active alert or turns it into a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreachCandidate {
    pub artifact_id: DbId,
    pub device_id: DbId,
    /// The stored reading that produced this breach.
    pub reading_id: DbId,
    pub quantity: Quantity,
    pub direction: BreachDirection,
    /// The observed value.
    pub measured_value: f64,
    /// The bound that was crossed.
    pub threshold_value: f64,
    /// Timestamp of the source reading; becomes the alert's `detected_at`.
    pub detected_at: Timestamp,
}
