use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::recipients;
use crate::state::AppState;

/// Routes mounted at `/recipients`.
///
/// ```text
/// GET    /                           -> list
/// POST   /                           -> create
/// DELETE /{id}                       -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(recipients::list).post(recipients::create))
        .route("/{id}", delete(recipients::delete))
}
