//! Route definitions for threshold export and import.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::thresholds;
use crate::state::AppState;

/// Routes mounted at `/thresholds`.
///
/// ```text
/// GET  /export                       -> export
/// POST /import?mode=atomic|partial   -> import
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/export", get(thresholds::export))
        .route("/import", post(thresholds::import))
}
