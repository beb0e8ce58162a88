//! Repository for the `host_thresholds` table.

use sqlx::PgPool;
use hostwatch_core::thresholds::ThresholdOverride;

use crate::models::threshold::HostThresholdRow;

/// Column list for `host_thresholds` queries.
const COLUMNS: &str = "\
    server_id, cpu_threshold, memory_threshold, disk_threshold, updated_at";

const UPSERT: &str = "\
    INSERT INTO host_thresholds (server_id, cpu_threshold, memory_threshold, disk_threshold) \
    VALUES ($1, $2, $3, $4) \
    ON CONFLICT (server_id) DO UPDATE SET \
       cpu_threshold = EXCLUDED.cpu_threshold, \
       memory_threshold = EXCLUDED.memory_threshold, \
       disk_threshold = EXCLUDED.disk_threshold, \
       updated_at = NOW()";

const DELETE: &str = "DELETE FROM host_thresholds WHERE server_id = $1";

/// Provides query operations for per-host threshold overrides.
pub struct ThresholdRepo;

impl ThresholdRepo {
    pub async fn list(pool: &PgPool) -> Result<Vec<HostThresholdRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM host_thresholds ORDER BY server_id");
        sqlx::query_as::<_, HostThresholdRow>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn find(pool: &PgPool, server_id: &str) -> Result<Option<HostThresholdRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM host_thresholds WHERE server_id = $1");
        sqlx::query_as::<_, HostThresholdRow>(&query)
            .bind(server_id)
            .fetch_optional(pool)
            .await
    }

    /// Write a host's override, replacing any previous row, and read it back.
    pub async fn upsert(
        pool: &PgPool,
        server_id: &str,
        value: &ThresholdOverride,
    ) -> Result<HostThresholdRow, sqlx::Error> {
        let query = format!("{UPSERT} RETURNING {COLUMNS}");
        sqlx::query_as::<_, HostThresholdRow>(&query)
            .bind(server_id)
            .bind(value.cpu_threshold)
            .bind(value.memory_threshold)
            .bind(value.disk_threshold)
            .fetch_one(pool)
            .await
    }

    /// Write many overrides in one transaction. Either every row is written
    /// or none is. Returns the number of rows written.
    ///
    /// An empty override removes the host's row, matching what a PUT with
    /// no fields does.
    pub async fn upsert_many(
        pool: &PgPool,
        rows: &[(String, ThresholdOverride)],
    ) -> Result<usize, sqlx::Error> {
        let mut tx = pool.begin().await?;
        for (server_id, value) in rows {
            if value.is_empty() {
                sqlx::query(DELETE)
                    .bind(server_id)
                    .execute(&mut *tx)
                    .await?;
                continue;
            }
            sqlx::query(UPSERT)
                .bind(server_id)
                .bind(value.cpu_threshold)
                .bind(value.memory_threshold)
                .bind(value.disk_threshold)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(rows.len())
    }

    /// Remove a host's override. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, server_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(DELETE)
            .bind(server_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
