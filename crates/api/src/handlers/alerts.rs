//! Handlers for alert queries and lifecycle changes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use vitrine_core::alert::BreachCandidate;
use vitrine_core::types::DbId;
use vitrine_db::models::alert::Alert;
use vitrine_pipeline::Reconciled;

use crate::error::AppResult;
use crate::query::AlertListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `PUT /alerts/{id}/status`.
///
/// `status` stays a string so that unknown values surface as
/// `INVALID_STATUS` instead of a generic deserialization failure.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

/// GET /api/v1/alerts
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(params): Query<AlertListParams>,
) -> AppResult<Json<DataResponse<Vec<Alert>>>> {
    let filter = params.into_filter()?;
    let alerts = state.pipeline.alerts().query(&filter).await?;
    Ok(Json(DataResponse { data: alerts }))
}

/// POST /api/v1/alerts/reconcile
///
/// Returns 201 when the candidate opened a new alert and 200 when it matched
/// an existing active one.
pub async fn reconcile_candidate(
    State(state): State<AppState>,
    Json(candidate): Json<BreachCandidate>,
) -> AppResult<(StatusCode, Json<DataResponse<Reconciled>>)> {
    let reconciled = state.pipeline.alerts().reconcile(&candidate).await?;
    let status = if reconciled.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(DataResponse { data: reconciled })))
}

/// GET /api/v1/alerts/{id}
pub async fn get_alert(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Alert>>> {
    let alert = state.pipeline.alerts().get(id).await?;
    Ok(Json(DataResponse { data: alert }))
}

/// PUT /api/v1/alerts/{id}/status
pub async fn set_alert_status(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<SetStatusRequest>,
) -> AppResult<Json<DataResponse<Alert>>> {
    let alert = state.pipeline.alerts().set_status(id, &body.status).await?;
    Ok(Json(DataResponse { data: alert }))
}
