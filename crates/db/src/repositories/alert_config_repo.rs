//! Repository for the singleton `alert_config` row.

use sqlx::PgPool;
use hostwatch_core::thresholds::GlobalAlertConfig;

use crate::models::threshold::AlertConfigRow;

const COLUMNS: &str = "cpu_total_percent, memory_used_percent, disk_used_percent, updated_at";

/// Provides access to the global alert defaults.
pub struct AlertConfigRepo;

impl AlertConfigRepo {
    /// The stored config, if the seed row exists.
    pub async fn get(pool: &PgPool) -> Result<Option<AlertConfigRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM alert_config WHERE id = 1");
        sqlx::query_as::<_, AlertConfigRow>(&query)
            .fetch_optional(pool)
            .await
    }

    pub async fn upsert(pool: &PgPool, config: &GlobalAlertConfig) -> Result<AlertConfigRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO alert_config (id, cpu_total_percent, memory_used_percent, disk_used_percent) \
             VALUES (1, $1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET \
                cpu_total_percent = EXCLUDED.cpu_total_percent, \
                memory_used_percent = EXCLUDED.memory_used_percent, \
                disk_used_percent = EXCLUDED.disk_used_percent, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AlertConfigRow>(&query)
            .bind(config.cpu_total_percent)
            .bind(config.memory_used_percent)
            .bind(config.disk_used_percent)
            .fetch_one(pool)
            .await
    }
}
