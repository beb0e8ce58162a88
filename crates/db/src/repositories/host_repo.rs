//! Repository for the `hosts` table.

use sqlx::PgPool;
use hostwatch_core::hosts::Host;
use hostwatch_core::types::Timestamp;

use crate::models::host::{HostRow, UpdateHost};

/// Column list for `hosts` queries.
const COLUMNS: &str = "\
    server_id, group_name, data_monitoring_enabled, report_interval, \
    last_seen_at, created_at, updated_at";

/// Provides CRUD operations for hosts.
pub struct HostRepo;

impl HostRepo {
    /// List every host ordered by `server_id`.
    pub async fn list(pool: &PgPool) -> Result<Vec<HostRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM hosts ORDER BY server_id");
        sqlx::query_as::<_, HostRow>(&query).fetch_all(pool).await
    }

    pub async fn find_by_id(pool: &PgPool, server_id: &str) -> Result<Option<HostRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM hosts WHERE server_id = $1");
        sqlx::query_as::<_, HostRow>(&query)
            .bind(server_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a host, or replace every field of an existing one.
    pub async fn upsert(pool: &PgPool, host: &Host) -> Result<HostRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO hosts (server_id, group_name, data_monitoring_enabled, report_interval) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (server_id) DO UPDATE SET \
                group_name = EXCLUDED.group_name, \
                data_monitoring_enabled = EXCLUDED.data_monitoring_enabled, \
                report_interval = EXCLUDED.report_interval, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, HostRow>(&query)
            .bind(&host.server_id)
            .bind(&host.group_name)
            .bind(host.data_monitoring_enabled)
            .bind(report_interval_column(host.report_interval))
            .fetch_one(pool)
            .await
    }

    /// Apply a partial update. Returns `None` if the host does not exist.
    pub async fn update(
        pool: &PgPool,
        server_id: &str,
        input: &UpdateHost,
    ) -> Result<Option<HostRow>, sqlx::Error> {
        let query = format!(
            "UPDATE hosts SET \
                group_name = CASE WHEN $2 THEN $3 ELSE group_name END, \
                data_monitoring_enabled = COALESCE($4, data_monitoring_enabled), \
                report_interval = COALESCE($5, report_interval), \
                updated_at = NOW() \
             WHERE server_id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, HostRow>(&query)
            .bind(server_id)
            .bind(input.group_name.is_some())
            .bind(input.group_name.clone().flatten())
            .bind(input.data_monitoring_enabled)
            .bind(input.report_interval.map(report_interval_column))
            .fetch_optional(pool)
            .await
    }

    /// Move one host to `group_name` (or out of any group with `None`).
    pub async fn set_group(
        pool: &PgPool,
        server_id: &str,
        group_name: Option<&str>,
    ) -> Result<Option<HostRow>, sqlx::Error> {
        let query = format!(
            "UPDATE hosts SET group_name = $2, updated_at = NOW() \
             WHERE server_id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, HostRow>(&query)
            .bind(server_id)
            .bind(group_name)
            .fetch_optional(pool)
            .await
    }

    /// Hosts that have reported at least once, with their last receive time.
    pub async fn list_last_seen(pool: &PgPool) -> Result<Vec<(String, Timestamp)>, sqlx::Error> {
        sqlx::query_as::<_, (String, Timestamp)>(
            "SELECT server_id, last_seen_at FROM hosts \
             WHERE last_seen_at IS NOT NULL ORDER BY server_id",
        )
        .fetch_all(pool)
        .await
    }

    /// Delete a host; its threshold row and samples cascade. Returns `true` if
    /// removed.
    pub async fn delete(pool: &PgPool, server_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM hosts WHERE server_id = $1")
            .bind(server_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn report_interval_column(secs: u32) -> i32 {
    i32::try_from(secs).unwrap_or(i32::MAX)
}
