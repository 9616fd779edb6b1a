pub mod alerts;
pub mod artifacts;
pub mod collection;
pub mod devices;
pub mod health;
pub mod materials;
pub mod readings;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /readings                     ingest a raw reading (POST)
///
/// /alerts                       list with filters (GET)
/// /alerts/reconcile             reconcile one breach candidate (POST)
/// /alerts/{id}                  get one alert
/// /alerts/{id}/status           dismiss or reactivate (PUT)
///
/// /collection/start             start a polling run (POST)
/// /collection/pause             pause the run (POST)
/// /collection/resume            resume the run (POST)
/// /collection/stop              stop the run (POST)
/// /collection/status            current run status (GET)
///
/// /devices/status               device liveness view (GET)
///
/// /materials                    create a material with validated bounds (POST)
/// /materials/{id}               get one material
///
/// /artifacts/{id}/data          delete an artifact's readings and alerts (DELETE)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/readings", readings::router())
        .nest("/alerts", alerts::router())
        .nest("/collection", collection::router())
        .nest("/devices", devices::router())
        .nest("/materials", materials::router())
        .nest("/artifacts", artifacts::router())
}
