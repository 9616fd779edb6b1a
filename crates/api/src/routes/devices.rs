use axum::routing::get;
use axum::Router;

use crate::handlers::devices;
use crate::state::AppState;

/// Routes mounted at `/devices`.
pub fn router() -> Router<AppState> {
    Router::new().route("/status", get(devices::list_device_status))
}
