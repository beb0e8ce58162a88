//! Persisted metric samples.

use sqlx::types::Json;
use sqlx::FromRow;
use hostwatch_core::metrics::{MetricSample, ResourceUsage};
use hostwatch_core::types::{DbId, Timestamp};

/// A row from the `metric_samples` table.
#[derive(Debug, Clone, FromRow)]
pub struct MetricSampleRow {
    pub id: DbId,
    pub server_id: String,
    pub sampled_at: Timestamp,
    pub received_at: Timestamp,
    pub usage: Json<ResourceUsage>,
}

impl MetricSampleRow {
    pub fn into_sample(self) -> MetricSample {
        MetricSample {
            host_id: self.server_id,
            timestamp: self.sampled_at,
            usage: self.usage.0,
        }
    }
}
