use axum::routing::post;
use axum::Router;

use crate::handlers::notifications;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// POST /test                         -> send_test
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/test", post(notifications::send_test))
}
