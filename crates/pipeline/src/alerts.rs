//! Alert deduplication and lifecycle.
//!
//! The alerts table is the only source of truth. "One active alert per
//! (artifact, quantity, direction)" is held by the database index, so
//! concurrent reconciles of the same breach need no in-process locking.

use std::time::Duration;

use serde::Serialize;
use sqlx::PgPool;
use vitrine_core::alert::{AlertStatus, BreachCandidate};
use vitrine_core::error::CoreError;
use vitrine_core::threshold_validation::validate_finite;
use vitrine_core::types::DbId;
use vitrine_db::models::alert::{Alert, AlertFilter};
use vitrine_db::repositories::alert_repo::ACTIVE_KEY_CONSTRAINT;
use vitrine_db::repositories::AlertRepo;

use crate::error::{foreign_key_violation, unique_violation};
use crate::{bounded, PipelineError};

/// Attempts before giving up when the active alert keeps vanishing between
/// the conflicting insert and the lookup (it was dismissed in between).
const MAX_RECONCILE_ATTEMPTS: usize = 3;

/// Result of reconciling one breach.
#[derive(Debug, Clone, Serialize)]
pub struct Reconciled {
    pub alert: Alert,
    /// `true` when this call opened the alert.
    pub created: bool,
}

/// Alert store service.
#[derive(Clone)]
pub struct AlertStore {
    pool: PgPool,
    timeout: Duration,
}

impl AlertStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Match a breach to its active alert, or open a new one.
    ///
    /// Never fails because another writer won the race: the loser returns
    /// the winner's alert with `created = false`.
    pub async fn reconcile(&self, candidate: &BreachCandidate) -> Result<Reconciled, PipelineError> {
        validate_finite(candidate.measured_value, "measured_value")?;
        validate_finite(candidate.threshold_value, "threshold_value")?;

        for _ in 0..MAX_RECONCILE_ATTEMPTS {
            let inserted = bounded(
                self.timeout,
                "alert insert",
                AlertRepo::insert_if_no_active(&self.pool, candidate),
            )
            .await
            .map_err(|e| map_reference_error(e, candidate))?;

            if let Some(alert) = inserted {
                tracing::info!(
                    alert_id = alert.id,
                    artifact_id = alert.artifact_id,
                    quantity = %alert.quantity,
                    direction = %alert.direction,
                    "Alert opened"
                );
                return Ok(Reconciled {
                    alert,
                    created: true,
                });
            }

            let existing = bounded(
                self.timeout,
                "active alert lookup",
                AlertRepo::find_active(
                    &self.pool,
                    candidate.artifact_id,
                    candidate.quantity,
                    candidate.direction,
                ),
            )
            .await?;

            if let Some(alert) = existing {
                tracing::debug!(alert_id = alert.id, "Breach matches active alert");
                return Ok(Reconciled {
                    alert,
                    created: false,
                });
            }
        }

        Err(CoreError::Conflict(format!(
            "active {} {} alert for artifact {} kept changing, giving up",
            candidate.quantity,
            candidate.direction.as_str(),
            candidate.artifact_id
        ))
        .into())
    }

    /// Change an alert's status (`active` or `dismissed`).
    pub async fn set_status(&self, alert_id: DbId, status: &str) -> Result<Alert, PipelineError> {
        let status = AlertStatus::parse(status)?;

        let updated = bounded(
            self.timeout,
            "alert status update",
            AlertRepo::set_status(&self.pool, alert_id, status),
        )
        .await
        .map_err(|e| match e {
            PipelineError::Database(ref db) if unique_violation(db) == Some(ACTIVE_KEY_CONSTRAINT) => {
                CoreError::Conflict(format!(
                    "alert {alert_id} cannot be reactivated: another alert is already active for the same quantity and direction"
                ))
                .into()
            }
            other => other,
        })?;

        let alert = updated.ok_or(CoreError::NotFound {
            entity: "Alert",
            id: alert_id,
        })?;
        tracing::info!(alert_id, status = status.as_str(), "Alert status changed");
        Ok(alert)
    }

    pub async fn get(&self, alert_id: DbId) -> Result<Alert, PipelineError> {
        bounded(
            self.timeout,
            "alert lookup",
            AlertRepo::find_by_id(&self.pool, alert_id),
        )
        .await?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: "Alert",
                id: alert_id,
            }
            .into()
        })
    }

    pub async fn query(&self, filter: &AlertFilter) -> Result<Vec<Alert>, PipelineError> {
        bounded(self.timeout, "alert query", AlertRepo::list(&self.pool, filter)).await
    }
}

/// A candidate pointing at a missing artifact, device or reading is a
/// not-found, not a database failure.
fn map_reference_error(err: PipelineError, candidate: &BreachCandidate) -> PipelineError {
    let PipelineError::Database(ref db) = err else {
        return err;
    };
    let not_found = match foreign_key_violation(db) {
        Some("fk_alerts_artifact") => CoreError::NotFound {
            entity: "Artifact",
            id: candidate.artifact_id,
        },
        Some("fk_alerts_device") => CoreError::NotFound {
            entity: "Device",
            id: candidate.device_id,
        },
        Some("fk_alerts_reading") => CoreError::NotFound {
            entity: "Reading",
            id: candidate.reading_id,
        },
        _ => return err,
    };
    not_found.into()
}
