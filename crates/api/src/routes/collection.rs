//! Route definitions for the polling scheduler.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::collection;
use crate::state::AppState;

/// Routes mounted at `/collection`.
///
/// ```text
/// POST /start     -> start_collection
/// POST /pause     -> pause_collection
/// POST /resume    -> resume_collection
/// POST /stop      -> stop_collection
/// GET  /status    -> collection_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(collection::start_collection))
        .route("/pause", post(collection::pause_collection))
        .route("/resume", post(collection::resume_collection))
        .route("/stop", post(collection::stop_collection))
        .route("/status", get(collection::collection_status))
}
