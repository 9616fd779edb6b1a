//! Device liveness classification.
//!
//! A device's status is derived from the time since its last measurement.
//! The cut-off durations are configuration, not constants; see
//! [`DeviceStatusPolicy`].

use chrono::Duration;
use serde::Serialize;

use crate::types::Timestamp;

/// Default age after which a device is considered offline.
pub const DEFAULT_OFFLINE_AFTER_MINS: i64 = 60;

/// Default age after which an offline device is considered inactive.
pub const DEFAULT_STALE_AFTER_MINS: i64 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    /// Reported within the offline window.
    Online,
    /// Silent for longer than the offline window.
    Offline,
    /// Never reported, or silent for longer than the stale window.
    Inactive,
    /// Flagged for maintenance; age is ignored.
    Maintenance,
}

/// Cut-offs used to classify devices.
#[derive(Debug, Clone, Copy)]
pub struct DeviceStatusPolicy {
    pub offline_after: Duration,
    pub stale_after: Duration,
}

impl Default for DeviceStatusPolicy {
    fn default() -> Self {
        Self {
            offline_after: Duration::minutes(DEFAULT_OFFLINE_AFTER_MINS),
            stale_after: Duration::minutes(DEFAULT_STALE_AFTER_MINS),
        }
    }
}

impl DeviceStatusPolicy {
    /// Build a policy from minute values, keeping `stale_after >= offline_after`.
    ///
    /// Values too large for a [`Duration`] saturate to [`Duration::MAX`].
    pub fn from_minutes(offline_after_mins: i64, stale_after_mins: i64) -> Self {
        let offline_after = saturating_minutes(offline_after_mins.max(1));
        let stale_after = saturating_minutes(stale_after_mins.max(0)).max(offline_after);
        Self {
            offline_after,
            stale_after,
        }
    }

    pub fn classify(
        &self,
        last_seen_at: Option<Timestamp>,
        maintenance: bool,
        now: Timestamp,
    ) -> DeviceStatus {
        if maintenance {
            return DeviceStatus::Maintenance;
        }
        let Some(last_seen) = last_seen_at else {
            return DeviceStatus::Inactive;
        };
        let age = now.signed_duration_since(last_seen);
        if age >= self.stale_after {
            DeviceStatus::Inactive
        } else if age >= self.offline_after {
            DeviceStatus::Offline
        } else {
            DeviceStatus::Online
        }
    }
}

fn saturating_minutes(minutes: i64) -> Duration {
    Duration::try_minutes(minutes).unwrap_or(Duration::MAX)
}
