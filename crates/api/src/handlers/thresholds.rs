//! Handlers for per-host threshold overrides and bulk transfer.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use hostwatch_core::threshold_transfer::{ImportMode, ImportReport, RawThresholdDocument};
use hostwatch_core::thresholds::ThresholdOverride;
use hostwatch_db::repositories::ThresholdRepo;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// A host's override as returned by the API. Absent values fall back to the
/// global default.
#[derive(Debug, Serialize)]
pub struct HostThreshold {
    pub server_id: String,
    #[serde(flatten)]
    pub thresholds: ThresholdOverride,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImportQuery {
    #[serde(default)]
    pub mode: ImportMode,
}

/// GET /api/v1/servers/{id}/threshold
pub async fn get(
    State(state): State<AppState>,
    Path(server_id): Path<String>,
) -> AppResult<Json<DataResponse<HostThreshold>>> {
    let thresholds = state.monitor.threshold(&server_id).await?.unwrap_or_default();
    Ok(Json(DataResponse {
        data: HostThreshold {
            server_id,
            thresholds,
        },
    }))
}

/// PUT /api/v1/servers/{id}/threshold
///
/// Replaces the override. A body with every field null clears it.
pub async fn set(
    State(state): State<AppState>,
    Path(server_id): Path<String>,
    Json(input): Json<ThresholdOverride>,
) -> AppResult<Json<DataResponse<HostThreshold>>> {
    input.validate()?;
    state.monitor.host(&server_id).await?;

    let thresholds = if input.is_empty() {
        ThresholdRepo::delete(&state.pool, &server_id).await?;
        state.monitor.clear_threshold(&server_id).await;
        ThresholdOverride::default()
    } else {
        let row = ThresholdRepo::upsert(&state.pool, &server_id, &input).await?;
        let stored = row.to_override();
        state.monitor.set_threshold(&server_id, stored).await?;
        stored
    };

    Ok(Json(DataResponse {
        data: HostThreshold {
            server_id,
            thresholds,
        },
    }))
}

/// DELETE /api/v1/servers/{id}/threshold
pub async fn clear(
    State(state): State<AppState>,
    Path(server_id): Path<String>,
) -> AppResult<StatusCode> {
    state.monitor.host(&server_id).await?;
    ThresholdRepo::delete(&state.pool, &server_id).await?;
    state.monitor.clear_threshold(&server_id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/thresholds/export
///
/// The bare transfer document, served as a download so it can be fed back
/// into the import endpoint unchanged.
pub async fn export(State(state): State<AppState>) -> impl IntoResponse {
    let document = state.monitor.export_thresholds().await;
    (
        [(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"thresholds.json\"",
        )],
        Json(document),
    )
}

/// POST /api/v1/thresholds/import?mode=atomic|partial
///
/// Every row is validated first. In `atomic` mode (the default) a single
/// rejected row means nothing is written.
pub async fn import(
    State(state): State<AppState>,
    Query(query): Query<ImportQuery>,
    Json(document): Json<RawThresholdDocument>,
) -> AppResult<Json<DataResponse<ImportReport>>> {
    let plan = state.monitor.plan_import(document).await;
    let rows = plan.rows_to_apply(query.mode);

    let applied = if rows.is_empty() {
        0
    } else {
        let written = ThresholdRepo::upsert_many(&state.pool, rows).await?;
        state.monitor.apply_thresholds(rows).await?;
        written
    };

    let report = plan.report(query.mode, applied);
    tracing::info!(
        mode = ?report.mode,
        total = report.total,
        applied = report.applied,
        invalid = report.invalid,
        "Threshold import finished"
    );
    Ok(Json(DataResponse { data: report }))
}
