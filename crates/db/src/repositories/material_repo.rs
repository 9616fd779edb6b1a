//! Repository for the `materials` table.

use sqlx::PgPool;
use vitrine_core::thresholds::MaterialThresholds;
use vitrine_core::types::DbId;

use crate::models::catalog::{CreateMaterial, Material};

const THRESHOLD_COLUMNS: &str = "\
    threshold_temperature_lower, threshold_temperature_upper, \
    threshold_humidity_lower, threshold_humidity_upper, \
    threshold_co2_lower, threshold_co2_upper, \
    threshold_air_pressure_lower, threshold_air_pressure_upper, \
    threshold_mold_risk_lower, threshold_mold_risk_upper, \
    threshold_illuminance_lower, threshold_illuminance_upper";

/// Provides CRUD operations for materials.
pub struct MaterialRepo;

impl MaterialRepo {
    pub async fn create(pool: &PgPool, input: &CreateMaterial) -> Result<Material, sqlx::Error> {
        let query = format!(
            "INSERT INTO materials (name, {THRESHOLD_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING id, name, {THRESHOLD_COLUMNS}, created_at, updated_at"
        );
        let t = &input.thresholds;
        sqlx::query_as::<_, Material>(&query)
            .bind(&input.name)
            .bind(t.temperature_lower)
            .bind(t.temperature_upper)
            .bind(t.humidity_lower)
            .bind(t.humidity_upper)
            .bind(t.co2_lower)
            .bind(t.co2_upper)
            .bind(t.air_pressure_lower)
            .bind(t.air_pressure_upper)
            .bind(t.mold_risk_lower)
            .bind(t.mold_risk_upper)
            .bind(t.illuminance_lower)
            .bind(t.illuminance_upper)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Material>, sqlx::Error> {
        let query = format!(
            "SELECT id, name, {THRESHOLD_COLUMNS}, created_at, updated_at \
             FROM materials WHERE id = $1"
        );
        sqlx::query_as::<_, Material>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Thresholds of the material assigned to an artifact.
    ///
    /// Returns `None` when the artifact has no material, or does not exist.
    pub async fn thresholds_for_artifact(
        pool: &PgPool,
        artifact_id: DbId,
    ) -> Result<Option<MaterialThresholds>, sqlx::Error> {
        let query = format!(
            "SELECT m.id, m.name, {THRESHOLD_COLUMNS}, m.created_at, m.updated_at \
             FROM materials m \
             JOIN artifacts a ON a.material_id = m.id \
             WHERE a.id = $1"
        );
        let material = sqlx::query_as::<_, Material>(&query)
            .bind(artifact_id)
            .fetch_optional(pool)
            .await?;
        Ok(material.map(|m| m.thresholds()))
    }
}
