//! Device liveness view.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use vitrine_core::device_status::DeviceStatus;
use vitrine_core::types::{DbId, Timestamp};
use vitrine_db::repositories::DeviceRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// One row of `GET /devices/status`.
#[derive(Debug, Serialize)]
pub struct DeviceStatusView {
    pub id: DbId,
    pub name: String,
    pub artifact_id: Option<DbId>,
    pub external_device_id: Option<String>,
    pub last_seen_at: Option<Timestamp>,
    pub status: DeviceStatus,
}

/// GET /api/v1/devices/status
///
/// Classifies every registered device with the configured status policy.
pub async fn list_device_status(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<DeviceStatusView>>>> {
    let now = Utc::now();
    let devices = DeviceRepo::list_all(&state.pool).await?;

    let views = devices
        .into_iter()
        .map(|d| DeviceStatusView {
            status: state
                .device_policy
                .classify(d.last_seen_at, d.maintenance, now),
            id: d.id,
            name: d.name,
            artifact_id: d.artifact_id,
            external_device_id: d.external_device_id,
            last_seen_at: d.last_seen_at,
        })
        .collect();

    Ok(Json(DataResponse { data: views }))
}
