//! Route definitions for alert endpoints.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::alerts;
use crate::state::AppState;

/// Routes mounted at `/alerts`.
///
/// ```text
/// GET  /               -> list_alerts
/// POST /reconcile      -> reconcile_candidate
/// GET  /{id}           -> get_alert
/// PUT  /{id}/status    -> set_alert_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(alerts::list_alerts))
        .route("/reconcile", post(alerts::reconcile_candidate))
        .route("/{id}", get(alerts::get_alert))
        .route("/{id}/status", put(alerts::set_alert_status))
}
