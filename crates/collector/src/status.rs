//! Externally visible collection-run state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Paused,
    Stopped,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Paused => "paused",
            RunStatus::Stopped => "stopped",
        }
    }
}

/// Point-in-time snapshot of the scheduler.
///
/// When no run exists every counter is zero and `run_id` is `None`;
/// `message` still carries the outcome of the previous run.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionStatus {
    pub run_id: Option<Uuid>,
    pub status: RunStatus,
    pub duration_secs: u64,
    pub interval_secs: u64,
    /// Running time so far; paused periods are not counted.
    pub elapsed_secs: u64,
    pub remaining_secs: u64,
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub alerts_created: u64,
    pub last_fetch_at: Option<DateTime<Utc>>,
    pub next_fetch_at: Option<DateTime<Utc>>,
    pub message: Option<String>,
}

impl CollectionStatus {
    pub fn stopped(message: Option<String>) -> Self {
        Self {
            run_id: None,
            status: RunStatus::Stopped,
            duration_secs: 0,
            interval_secs: 0,
            elapsed_secs: 0,
            remaining_secs: 0,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            alerts_created: 0,
            last_fetch_at: None,
            next_fetch_at: None,
            message,
        }
    }
}
