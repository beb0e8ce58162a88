//! Repository for the `recipients` table.

use sqlx::PgPool;
use hostwatch_core::alert::NewRecipient;
use hostwatch_core::types::DbId;

use crate::models::alert::RecipientRow;

const COLUMNS: &str = "id, email, name, category, created_at";

/// Provides CRUD operations for always-notify recipients.
pub struct RecipientRepo;

impl RecipientRepo {
    pub async fn list(pool: &PgPool) -> Result<Vec<RecipientRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM recipients ORDER BY email");
        sqlx::query_as::<_, RecipientRow>(&query).fetch_all(pool).await
    }

    /// Insert a validated recipient. A duplicate email violates
    /// `uq_recipients_email`.
    pub async fn create(pool: &PgPool, input: &NewRecipient) -> Result<RecipientRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO recipients (email, name, category) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RecipientRow>(&query)
            .bind(&input.email)
            .bind(&input.name)
            .bind(input.category.as_str())
            .fetch_one(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM recipients WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
