//! Repository for the `devices` table.

use sqlx::PgPool;
use vitrine_core::types::{DbId, Timestamp};

use crate::models::catalog::{CreateDevice, Device};

const COLUMNS: &str = "\
    id, artifact_id, external_device_id, name, maintenance, \
    last_seen_at, created_at, updated_at";

/// Provides registry operations for sensor devices.
pub struct DeviceRepo;

impl DeviceRepo {
    pub async fn create(pool: &PgPool, input: &CreateDevice) -> Result<Device, sqlx::Error> {
        let query = format!(
            "INSERT INTO devices (artifact_id, external_device_id, name, maintenance) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Device>(&query)
            .bind(input.artifact_id)
            .bind(&input.external_device_id)
            .bind(&input.name)
            .bind(input.maintenance)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Device>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM devices WHERE id = $1");
        sqlx::query_as::<_, Device>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Record that a device reported at `seen_at`.
    ///
    /// Never moves `last_seen_at` backwards, so a late backfilled reading
    /// does not make a live device look stale. Returns `false` if the device
    /// does not exist.
    pub async fn touch_last_seen(
        pool: &PgPool,
        id: DbId,
        seen_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE devices SET \
                last_seen_at = GREATEST(COALESCE(last_seen_at, $2), $2), \
                updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(seen_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_maintenance(
        pool: &PgPool,
        id: DbId,
        maintenance: bool,
    ) -> Result<Option<Device>, sqlx::Error> {
        let query = format!(
            "UPDATE devices SET maintenance = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Device>(&query)
            .bind(id)
            .bind(maintenance)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Device>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM devices ORDER BY id");
        sqlx::query_as::<_, Device>(&query).fetch_all(pool).await
    }

    /// Devices the collector should poll: linked to the vendor cloud,
    /// assigned to an artifact, and not under maintenance.
    pub async fn list_pollable(pool: &PgPool) -> Result<Vec<Device>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM devices \
             WHERE external_device_id IS NOT NULL \
               AND artifact_id IS NOT NULL \
               AND maintenance = false \
             ORDER BY id"
        );
        sqlx::query_as::<_, Device>(&query).fetch_all(pool).await
    }
}
