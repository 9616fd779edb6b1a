//! Repository for the `artifacts` table.

use sqlx::PgPool;
use vitrine_core::types::DbId;

use crate::models::catalog::{Artifact, CreateArtifact};

const COLUMNS: &str = "id, name, material_id, notification_email, created_at, updated_at";

/// Provides CRUD operations for artifacts.
pub struct ArtifactRepo;

impl ArtifactRepo {
    pub async fn create(pool: &PgPool, input: &CreateArtifact) -> Result<Artifact, sqlx::Error> {
        let query = format!(
            "INSERT INTO artifacts (name, material_id, notification_email) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Artifact>(&query)
            .bind(&input.name)
            .bind(input.material_id)
            .bind(&input.notification_email)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Artifact>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM artifacts WHERE id = $1");
        sqlx::query_as::<_, Artifact>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
