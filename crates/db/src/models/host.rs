//! Host rows and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use hostwatch_core::hosts::Host;
use hostwatch_core::types::Timestamp;

/// A row from the `hosts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct HostRow {
    pub server_id: String,
    pub group_name: Option<String>,
    pub data_monitoring_enabled: bool,
    pub report_interval: i32,
    /// Receive time of the host's latest report, if it ever reported.
    pub last_seen_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl HostRow {
    pub fn into_host(self) -> Host {
        Host {
            server_id: self.server_id,
            group_name: self.group_name,
            data_monitoring_enabled: self.data_monitoring_enabled,
            report_interval: u32::try_from(self.report_interval.max(1)).unwrap_or(1),
        }
    }
}

/// Partial update for a host. `None` leaves a field unchanged.
///
/// `group_name` is double-optional: `Some(None)` removes the host from its
/// group.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateHost {
    #[serde(default, deserialize_with = "double_option")]
    pub group_name: Option<Option<String>>,
    pub data_monitoring_enabled: Option<bool>,
    pub report_interval: Option<u32>,
}

fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}
