//! Repository for the `metric_samples` table (append-only, pruned per host).

use sqlx::types::Json;
use sqlx::PgPool;
use hostwatch_core::metrics::MetricSample;
use hostwatch_core::types::Timestamp;

use crate::models::sample::MetricSampleRow;

/// Column list for `metric_samples` SELECT queries.
const COLUMNS: &str = "id, server_id, sampled_at, received_at, usage";

/// Rows ranked newest first within each host.
const RANKED: &str = "\
    SELECT id, server_id, sampled_at, received_at, usage, \
           row_number() OVER (PARTITION BY server_id ORDER BY received_at DESC, id DESC) AS rn \
    FROM metric_samples";

/// Provides query operations for persisted samples.
pub struct SampleRepo;

impl SampleRepo {
    /// Store one accepted sample and advance its host's `last_seen_at`.
    ///
    /// `last_seen_at` never moves backwards, so writes landing out of order
    /// keep the latest receive time.
    pub async fn record(
        pool: &PgPool,
        sample: &MetricSample,
        received_at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query(
            "INSERT INTO metric_samples (server_id, sampled_at, received_at, usage) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&sample.host_id)
        .bind(sample.timestamp)
        .bind(received_at)
        .bind(Json(&sample.usage))
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "UPDATE hosts SET last_seen_at = GREATEST(COALESCE(last_seen_at, $2), $2) \
             WHERE server_id = $1",
        )
        .bind(&sample.host_id)
        .bind(received_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await
    }

    /// The newest `per_host` samples of every host, oldest first within each
    /// host.
    pub async fn recent_per_host(
        pool: &PgPool,
        per_host: i64,
    ) -> Result<Vec<MetricSampleRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ({RANKED}) ranked \
             WHERE rn <= $1 \
             ORDER BY server_id, received_at, id"
        );
        sqlx::query_as::<_, MetricSampleRow>(&query)
            .bind(per_host)
            .fetch_all(pool)
            .await
    }

    /// Delete every sample beyond the newest `keep` of its host.
    ///
    /// Returns the number of rows deleted.
    pub async fn prune_per_host(pool: &PgPool, keep: i64) -> Result<u64, sqlx::Error> {
        let query = format!(
            "DELETE FROM metric_samples WHERE id IN \
             (SELECT id FROM ({RANKED}) ranked WHERE rn > $1)"
        );
        let result = sqlx::query(&query).bind(keep).execute(pool).await?;
        Ok(result.rows_affected())
    }
}
