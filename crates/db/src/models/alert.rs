//! Alert rule and recipient rows.
//!
//! Enum-valued columns are stored as text and parsed on conversion.

use serde::Serialize;
use sqlx::FromRow;
use hostwatch_core::alert::{AlertRule, AlertType, Recipient, RecipientCategory, Scope};
use hostwatch_core::error::CoreError;
use hostwatch_core::types::{DbId, Timestamp};

/// A row from the `alert_rules` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AlertRuleRow {
    pub id: DbId,
    pub alert_type: String,
    pub scope: String,
    pub target_id: Option<String>,
    pub emails: Vec<String>,
    pub created_at: Timestamp,
}

impl TryFrom<AlertRuleRow> for AlertRule {
    type Error = CoreError;

    fn try_from(row: AlertRuleRow) -> Result<Self, Self::Error> {
        Ok(AlertRule {
            id: row.id,
            alert_type: AlertType::from_str_value(&row.alert_type)?,
            scope: Scope::from_str_value(&row.scope)?,
            target_id: row.target_id,
            emails: row.emails,
        })
    }
}

/// A row from the `recipients` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RecipientRow {
    pub id: DbId,
    pub email: String,
    pub name: Option<String>,
    pub category: String,
    pub created_at: Timestamp,
}

impl TryFrom<RecipientRow> for Recipient {
    type Error = CoreError;

    fn try_from(row: RecipientRow) -> Result<Self, Self::Error> {
        Ok(Recipient {
            id: row.id,
            email: row.email,
            name: row.name,
            category: RecipientCategory::from_str_value(&row.category)?,
        })
    }
}
