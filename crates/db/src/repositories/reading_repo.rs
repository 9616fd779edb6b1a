//! Repository for the `readings` table (append-only time-series).

use serde::Serialize;
use sqlx::PgPool;
use vitrine_core::reading::NormalizedReading;
use vitrine_core::types::DbId;

use crate::models::reading::Reading;

/// Column list for `readings` SELECT queries.
const COLUMNS: &str = "\
    id, artifact_id, device_id, \
    temperature, humidity, co2, air_pressure, mold_risk, illuminance, \
    recorded_at, created_at";

/// Column list for INSERT (excludes auto-generated `id` and `created_at`).
const INSERT_COLUMNS: &str = "\
    artifact_id, device_id, \
    temperature, humidity, co2, air_pressure, mold_risk, illuminance, \
    recorded_at";

/// Row counts removed by a data reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PurgeSummary {
    pub alerts_deleted: u64,
    pub readings_deleted: u64,
}

/// Provides query operations for sensor readings.
pub struct ReadingRepo;

impl ReadingRepo {
    /// Insert a validated reading.
    pub async fn insert(pool: &PgPool, reading: &NormalizedReading) -> Result<Reading, sqlx::Error> {
        let query = format!(
            "INSERT INTO readings ({INSERT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        let v = &reading.values;
        sqlx::query_as::<_, Reading>(&query)
            .bind(reading.artifact_id)
            .bind(reading.device_id)
            .bind(v.temperature)
            .bind(v.humidity)
            .bind(v.co2)
            .bind(v.air_pressure)
            .bind(v.mold_risk)
            .bind(v.illuminance)
            .bind(reading.recorded_at)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Reading>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM readings WHERE id = $1");
        sqlx::query_as::<_, Reading>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Most recent readings for an artifact, newest first.
    pub async fn list_for_artifact(
        pool: &PgPool,
        artifact_id: DbId,
        limit: i64,
    ) -> Result<Vec<Reading>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM readings \
             WHERE artifact_id = $1 \
             ORDER BY recorded_at DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, Reading>(&query)
            .bind(artifact_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Delete every alert and reading belonging to an artifact.
    ///
    /// Runs in one transaction; alerts go first because they reference
    /// readings.
    pub async fn purge_artifact_data(
        pool: &PgPool,
        artifact_id: DbId,
    ) -> Result<PurgeSummary, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let alerts = sqlx::query("DELETE FROM alerts WHERE artifact_id = $1")
            .bind(artifact_id)
            .execute(&mut *tx)
            .await?;

        let readings = sqlx::query("DELETE FROM readings WHERE artifact_id = $1")
            .bind(artifact_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(PurgeSummary {
            alerts_deleted: alerts.rows_affected(),
            readings_deleted: readings.rows_affected(),
        })
    }
}
