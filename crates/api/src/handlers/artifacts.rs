use axum::extract::{Path, State};
use axum::Json;
use vitrine_core::types::DbId;
use vitrine_db::repositories::PurgeSummary;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// DELETE /api/v1/artifacts/{id}/data
///
/// Removes the artifact's alerts and readings. The artifact itself, its
/// material and its devices are kept.
pub async fn reset_artifact_data(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PurgeSummary>>> {
    let summary = vitrine_pipeline::reset_artifact_data(&state.pool, id).await?;
    Ok(Json(DataResponse { data: summary }))
}
