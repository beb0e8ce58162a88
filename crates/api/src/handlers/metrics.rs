//! Handlers for metric ingestion and history.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use hostwatch_core::metrics::{MetricReport, MetricSample};
use hostwatch_core::monitor::IngestAck;
use hostwatch_core::types::Timestamp;
use hostwatch_db::repositories::SampleRepo;
use serde::Deserialize;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Samples returned when `limit` is omitted.
const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Most recent samples to return (default: 100, capped at capacity).
    pub limit: Option<usize>,
}

/// POST /api/v1/metrics
///
/// Ingest one report. The acknowledgement carries the host's
/// `report_interval`.
///
/// The sample and the host's receive time are written to the database in the
/// background; a failed write is logged and never fails the ingest.
pub async fn ingest(
    State(state): State<AppState>,
    Json(report): Json<MetricReport>,
) -> AppResult<Json<DataResponse<IngestAck>>> {
    let received_at = Utc::now();
    let ingested = state.monitor.ingest(report, received_at).await?;
    tokio::spawn(persist_sample(state.pool.clone(), ingested.sample, received_at));
    Ok(Json(DataResponse { data: ingested.ack }))
}

async fn persist_sample(pool: PgPool, sample: MetricSample, received_at: Timestamp) {
    if let Err(e) = SampleRepo::record(&pool, &sample, received_at).await {
        tracing::warn!(host_id = %sample.host_id, error = %e, "Failed to persist sample");
    }
}

/// GET /api/v1/servers/{id}/metrics?limit=N
///
/// Most recent samples for one host, oldest first.
pub async fn history(
    State(state): State<AppState>,
    Path(server_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<DataResponse<Vec<MetricSample>>>> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    if limit == 0 {
        return Err(AppError::BadRequest("limit must be at least 1".to_string()));
    }
    let samples = state.monitor.history(&server_id, limit).await?;
    Ok(Json(DataResponse { data: samples }))
}
