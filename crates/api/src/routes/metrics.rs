//! Route definitions for metric ingestion.

use axum::routing::post;
use axum::Router;

use crate::handlers::metrics;
use crate::state::AppState;

/// Routes merged at the API root.
///
/// ```text
/// POST /metrics                      -> ingest
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/metrics", post(metrics::ingest))
}
