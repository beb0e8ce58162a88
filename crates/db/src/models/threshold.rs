//! Threshold rows: per-host overrides and the global alert config.

use serde::Serialize;
use sqlx::FromRow;
use hostwatch_core::thresholds::{GlobalAlertConfig, ThresholdOverride};
use hostwatch_core::types::Timestamp;

/// A row from the `host_thresholds` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct HostThresholdRow {
    pub server_id: String,
    pub cpu_threshold: Option<f64>,
    pub memory_threshold: Option<f64>,
    pub disk_threshold: Option<f64>,
    pub updated_at: Timestamp,
}

impl HostThresholdRow {
    pub fn to_override(&self) -> ThresholdOverride {
        ThresholdOverride {
            cpu_threshold: self.cpu_threshold,
            memory_threshold: self.memory_threshold,
            disk_threshold: self.disk_threshold,
        }
    }
}

/// The singleton row of the `alert_config` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AlertConfigRow {
    pub cpu_total_percent: Option<f64>,
    pub memory_used_percent: Option<f64>,
    pub disk_used_percent: Option<f64>,
    pub updated_at: Timestamp,
}

impl AlertConfigRow {
    pub fn to_config(&self) -> GlobalAlertConfig {
        GlobalAlertConfig {
            cpu_total_percent: self.cpu_total_percent,
            memory_used_percent: self.memory_used_percent,
            disk_used_percent: self.disk_used_percent,
        }
    }
}
