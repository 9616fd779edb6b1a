//! Repository for the `alerts` table.
//!
//! The "one active alert per (artifact, quantity, direction)" rule is
//! enforced by the partial unique index `uq_alerts_active_key`; the insert
//! here is written against that index so a concurrent duplicate becomes a
//! no-op instead of an error.

use sqlx::PgPool;
use vitrine_core::alert::{AlertStatus, BreachCandidate, BreachDirection};
use vitrine_core::quantity::Quantity;
use vitrine_core::types::DbId;

use super::clamp_limit;
use crate::models::alert::{Alert, AlertFilter};

/// Name of the partial unique index guarding active alerts.
pub const ACTIVE_KEY_CONSTRAINT: &str = "uq_alerts_active_key";

/// Column list for `alerts` queries.
const COLUMNS: &str = "\
    id, artifact_id, device_id, reading_id, quantity, direction, \
    measured_value, threshold_value, status, \
    detected_at, created_at, updated_at, dismissed_at";

/// Column list for INSERT (excludes auto-generated columns).
const INSERT_COLUMNS: &str = "\
    artifact_id, device_id, reading_id, quantity, direction, \
    measured_value, threshold_value, status, detected_at";

/// Provides query operations for alerts.
pub struct AlertRepo;

impl AlertRepo {
    /// Insert an active alert for the candidate unless one is already active
    /// for the same key.
    ///
    /// Returns `None` when the insert lost to an existing active alert.
    pub async fn insert_if_no_active(
        pool: &PgPool,
        candidate: &BreachCandidate,
    ) -> Result<Option<Alert>, sqlx::Error> {
        let query = format!(
            "INSERT INTO alerts ({INSERT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (artifact_id, quantity, direction) WHERE status = 'active' \
             DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Alert>(&query)
            .bind(candidate.artifact_id)
            .bind(candidate.device_id)
            .bind(candidate.reading_id)
            .bind(candidate.quantity.as_str())
            .bind(candidate.direction.as_str())
            .bind(candidate.measured_value)
            .bind(candidate.threshold_value)
            .bind(AlertStatus::Active.as_str())
            .bind(candidate.detected_at)
            .fetch_optional(pool)
            .await
    }

    /// Find the active alert for an (artifact, quantity, direction) key.
    pub async fn find_active(
        pool: &PgPool,
        artifact_id: DbId,
        quantity: Quantity,
        direction: BreachDirection,
    ) -> Result<Option<Alert>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM alerts \
             WHERE artifact_id = $1 AND quantity = $2 AND direction = $3 \
               AND status = 'active'"
        );
        sqlx::query_as::<_, Alert>(&query)
            .bind(artifact_id)
            .bind(quantity.as_str())
            .bind(direction.as_str())
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Alert>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM alerts WHERE id = $1");
        sqlx::query_as::<_, Alert>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Set the status of an alert.
    ///
    /// Dismissal stamps `dismissed_at`; reactivation clears it. Both stamp
    /// `updated_at`. Reactivating while another alert holds the active key
    /// fails with a unique violation on [`ACTIVE_KEY_CONSTRAINT`].
    /// Returns `None` if the alert does not exist.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: AlertStatus,
    ) -> Result<Option<Alert>, sqlx::Error> {
        let query = match status {
            AlertStatus::Dismissed => format!(
                "UPDATE alerts SET \
                    status = $2, \
                    dismissed_at = NOW(), \
                    updated_at = NOW() \
                 WHERE id = $1 \
                 RETURNING {COLUMNS}"
            ),
            AlertStatus::Active => format!(
                "UPDATE alerts SET \
                    status = $2, \
                    dismissed_at = NULL, \
                    updated_at = NOW() \
                 WHERE id = $1 \
                 RETURNING {COLUMNS}"
            ),
        };
        sqlx::query_as::<_, Alert>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(pool)
            .await
    }

    /// List alerts matching the filter, newest detection first.
    pub async fn list(pool: &PgPool, filter: &AlertFilter) -> Result<Vec<Alert>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM alerts \
             WHERE ($1::BIGINT IS NULL OR artifact_id = $1) \
               AND ($2::BIGINT IS NULL OR device_id = $2) \
               AND ($3::TEXT IS NULL OR status = $3) \
               AND ($4::TEXT IS NULL OR quantity = $4) \
             ORDER BY detected_at DESC, id DESC \
             LIMIT $5"
        );
        sqlx::query_as::<_, Alert>(&query)
            .bind(filter.artifact_id)
            .bind(filter.device_id)
            .bind(filter.status.map(AlertStatus::as_str))
            .bind(filter.quantity.map(Quantity::as_str))
            .bind(clamp_limit(filter.limit))
            .fetch_all(pool)
            .await
    }
}
