//! Repository for the `alert_rules` table.

use sqlx::PgPool;
use hostwatch_core::alert::NewAlertRule;
use hostwatch_core::types::DbId;

use crate::models::alert::AlertRuleRow;

/// Column list for `alert_rules` queries.
const COLUMNS: &str = "id, alert_type, scope, target_id, emails, created_at";

/// Provides CRUD operations for alert rules.
pub struct AlertRuleRepo;

impl AlertRuleRepo {
    pub async fn list(pool: &PgPool) -> Result<Vec<AlertRuleRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM alert_rules ORDER BY id");
        sqlx::query_as::<_, AlertRuleRow>(&query).fetch_all(pool).await
    }

    /// Insert an already validated rule.
    pub async fn create(pool: &PgPool, rule: &NewAlertRule) -> Result<AlertRuleRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO alert_rules (alert_type, scope, target_id, emails) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AlertRuleRow>(&query)
            .bind(rule.alert_type.as_str())
            .bind(rule.scope.as_str())
            .bind(&rule.target_id)
            .bind(&rule.emails)
            .fetch_one(pool)
            .await
    }

    /// Delete a rule. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM alert_rules WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
