//! Route definitions for hosts and their per-host resources.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{metrics, servers, thresholds};
use crate::state::AppState;

/// Routes mounted at `/servers`.
///
/// ```text
/// GET    /                           -> list
/// POST   /                           -> register
/// POST   /groups/bulk                -> bulk_reassign
/// PUT    /{id}                       -> update
/// DELETE /{id}                       -> remove
/// GET    /{id}/metrics               -> metrics::history
/// GET    /{id}/threshold             -> thresholds::get
/// PUT    /{id}/threshold             -> thresholds::set
/// DELETE /{id}/threshold             -> thresholds::clear
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(servers::list).post(servers::register))
        .route("/groups/bulk", post(servers::bulk_reassign))
        .route("/{id}", put(servers::update).delete(servers::remove))
        .route("/{id}/metrics", get(metrics::history))
        .route(
            "/{id}/threshold",
            get(thresholds::get)
                .put(thresholds::set)
                .delete(thresholds::clear),
        )
}
