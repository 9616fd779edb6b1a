//! Bulk data reset for one artifact.

use sqlx::PgPool;
use vitrine_core::error::CoreError;
use vitrine_core::types::DbId;
use vitrine_db::repositories::{ArtifactRepo, PurgeSummary, ReadingRepo};

use crate::PipelineError;

/// Delete every alert and reading of an artifact, keeping the catalog rows.
///
/// This is the only path that removes alerts.
pub async fn reset_artifact_data(
    pool: &PgPool,
    artifact_id: DbId,
) -> Result<PurgeSummary, PipelineError> {
    if ArtifactRepo::find_by_id(pool, artifact_id).await?.is_none() {
        return Err(CoreError::NotFound {
            entity: "Artifact",
            id: artifact_id,
        }
        .into());
    }

    let summary = ReadingRepo::purge_artifact_data(pool, artifact_id).await?;
    tracing::info!(
        artifact_id,
        alerts_deleted = summary.alerts_deleted,
        readings_deleted = summary.readings_deleted,
        "Artifact data reset"
    );
    Ok(summary)
}
