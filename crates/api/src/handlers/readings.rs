//! Handler for pushed sensor readings.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use vitrine_pipeline::IngestOutcome;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/readings
///
/// Accepts a raw reading object in any supported vendor spelling, stores it,
/// and returns the reading with the alerts it produced.
pub async fn ingest_reading(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<(StatusCode, Json<DataResponse<IngestOutcome>>)> {
    let Value::Object(raw) = body else {
        return Err(AppError::BadRequest(
            "reading payload must be a JSON object".into(),
        ));
    };

    let outcome = state.pipeline.ingest(&raw).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: outcome })))
}
