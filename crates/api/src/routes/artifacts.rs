use axum::routing::delete;
use axum::Router;

use crate::handlers::artifacts;
use crate::state::AppState;

/// Routes mounted at `/artifacts`.
///
/// ```text
/// DELETE /{id}/data    -> reset_artifact_data
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/data", delete(artifacts::reset_artifact_data))
}
