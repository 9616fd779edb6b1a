use axum::routing::{get, post};
use axum::Router;

use crate::handlers::materials;
use crate::state::AppState;

/// Routes mounted at `/materials`.
///
/// ```text
/// POST /         -> create_material
/// GET  /{id}     -> get_material
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(materials::create_material))
        .route("/{id}", get(materials::get_material))
}
