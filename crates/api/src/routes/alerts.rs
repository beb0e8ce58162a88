//! Route definitions for alert configuration and rules.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::alerts;
use crate::state::AppState;

/// Routes merged at the API root.
///
/// ```text
/// GET    /alerts/config              -> get_config
/// PUT    /alerts/config              -> update_config
/// GET    /alerts/active              -> active
/// GET    /alert-rules                -> list_rules
/// POST   /alert-rules                -> create_rule
/// DELETE /alert-rules/{id}           -> delete_rule
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/alerts/config",
            get(alerts::get_config).put(alerts::update_config),
        )
        .route("/alerts/active", get(alerts::active))
        .route(
            "/alert-rules",
            get(alerts::list_rules).post(alerts::create_rule),
        )
        .route("/alert-rules/{id}", delete(alerts::delete_rule))
}
