pub mod alerts;
pub mod health;
pub mod metrics;
pub mod notifications;
pub mod recipients;
pub mod servers;
pub mod thresholds;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /metrics                                         ingest a report (POST)
///
/// /servers                                         list, register
/// /servers/groups/bulk                             bulk group reassignment (POST)
/// /servers/{id}                                    update, delete
/// /servers/{id}/metrics                            sample history (GET)
/// /servers/{id}/threshold                          get, replace, clear override
///
/// /thresholds/export                               download every override (GET)
/// /thresholds/import                               import overrides (POST)
///
/// /alerts/config                                   get, update global thresholds
/// /alerts/active                                   current breaches (GET)
/// /alert-rules                                     list, create
/// /alert-rules/{id}                                delete
///
/// /recipients                                      list, create
/// /recipients/{id}                                 delete
///
/// /notifications/test                              send a test message (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(metrics::router())
        .nest("/servers", servers::router())
        .nest("/thresholds", thresholds::router())
        .merge(alerts::router())
        .nest("/recipients", recipients::router())
        .nest("/notifications", notifications::router())
}
