//! Postgres persistence for hostwatch configuration.
//!
//! Hosts, threshold overrides, the global alert config, alert rules and
//! recipients live here, along with each host's last receive time and a
//! bounded tail of its samples.

use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod repositories;
pub mod snapshot;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to verify connectivity.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
