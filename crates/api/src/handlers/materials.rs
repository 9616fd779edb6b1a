//! Handlers for the material catalog.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use vitrine_core::error::CoreError;
use vitrine_core::types::DbId;
use vitrine_db::models::catalog::{CreateMaterial, Material};
use vitrine_db::repositories::MaterialRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/materials
///
/// Rejects blank names and inverted or non-finite bounds before anything is
/// stored.
pub async fn create_material(
    State(state): State<AppState>,
    Json(input): Json<CreateMaterial>,
) -> AppResult<(StatusCode, Json<DataResponse<Material>>)> {
    if input.name.trim().is_empty() {
        return Err(CoreError::Validation("name must not be empty".into()).into());
    }
    input.thresholds.validate()?;

    let material = MaterialRepo::create(&state.pool, &input).await?;
    tracing::info!(material_id = material.id, name = %material.name, "Material created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: material })))
}

/// GET /api/v1/materials/{id}
pub async fn get_material(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Material>>> {
    let material = MaterialRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Material",
            id,
        })?;
    Ok(Json(DataResponse { data: material }))
}
