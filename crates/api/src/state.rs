use std::sync::Arc;

use hostwatch_core::monitor::Monitor;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: inner data is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: hostwatch_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// In-memory monitoring aggregate (history, breach state, config mirror).
    pub monitor: Arc<Monitor>,
}
