//! Handlers driving the device-cloud polling scheduler.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use vitrine_collector::CollectionStatus;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /collection/start`.
#[derive(Debug, Deserialize)]
pub struct StartCollectionRequest {
    /// Total running time of the run, pauses excluded.
    pub duration_minutes: u64,
    /// Delay between polling cycles.
    pub interval_seconds: u64,
}

/// POST /api/v1/collection/start
pub async fn start_collection(
    State(state): State<AppState>,
    Json(body): Json<StartCollectionRequest>,
) -> AppResult<Json<DataResponse<CollectionStatus>>> {
    let status = state
        .scheduler
        .start(body.duration_minutes, body.interval_seconds)
        .await?;
    Ok(Json(DataResponse { data: status }))
}

/// POST /api/v1/collection/pause
pub async fn pause_collection(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<CollectionStatus>>> {
    let status = state.scheduler.pause().await?;
    Ok(Json(DataResponse { data: status }))
}

/// POST /api/v1/collection/resume
pub async fn resume_collection(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<CollectionStatus>>> {
    let status = state.scheduler.resume().await?;
    Ok(Json(DataResponse { data: status }))
}

/// POST /api/v1/collection/stop
///
/// Always succeeds; stopping an idle scheduler returns its status unchanged.
pub async fn stop_collection(
    State(state): State<AppState>,
) -> Json<DataResponse<CollectionStatus>> {
    Json(DataResponse {
        data: state.scheduler.stop().await,
    })
}

/// GET /api/v1/collection/status
pub async fn collection_status(
    State(state): State<AppState>,
) -> Json<DataResponse<CollectionStatus>> {
    Json(DataResponse {
        data: state.scheduler.status().await,
    })
}
