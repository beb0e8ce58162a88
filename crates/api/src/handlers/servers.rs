//! Handlers for host registration, updates and bulk group reassignment.
//!
//! Every write goes to the database first and is then mirrored into the
//! in-memory monitor from the row that was read back.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use hostwatch_core::error::CoreError;
use hostwatch_core::groups::{BulkGroupRequest, BulkReport};
use hostwatch_core::hosts::{normalize_group, Host};
use hostwatch_core::monitor::HostStatus;
use hostwatch_db::models::host::UpdateHost;
use hostwatch_db::repositories::HostRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for registering (or re-registering) a host.
///
/// Fields left out keep their current value, or the default for a new host.
#[derive(Debug, Deserialize)]
pub struct RegisterHost {
    pub server_id: String,
    pub group_name: Option<String>,
    pub data_monitoring_enabled: Option<bool>,
    pub report_interval: Option<u32>,
}

/// GET /api/v1/servers
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<HostStatus>>>> {
    Ok(Json(DataResponse {
        data: state.monitor.hosts().await,
    }))
}

/// POST /api/v1/servers
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterHost>,
) -> AppResult<(StatusCode, Json<DataResponse<Host>>)> {
    let server_id = input.server_id.trim().to_string();
    let existing = state.monitor.host(&server_id).await.ok();
    let status = if existing.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    let mut host = existing.unwrap_or_else(|| {
        let mut host = Host::new(server_id.clone());
        host.report_interval = state.config.monitor.default_report_interval;
        host
    });
    if input.group_name.is_some() {
        host.group_name = normalize_group(input.group_name);
    }
    if let Some(enabled) = input.data_monitoring_enabled {
        host.data_monitoring_enabled = enabled;
    }
    if let Some(interval) = input.report_interval {
        host.report_interval = interval;
    }
    host.validate()?;

    let row = HostRepo::upsert(&state.pool, &host).await?;
    let host = row.into_host();
    state.monitor.upsert_host(host.clone()).await;

    tracing::info!(
        server_id = %host.server_id,
        created = status == StatusCode::CREATED,
        "Host registered"
    );
    Ok((status, Json(DataResponse { data: host })))
}

/// PUT /api/v1/servers/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(server_id): Path<String>,
    Json(mut input): Json<UpdateHost>,
) -> AppResult<Json<DataResponse<Host>>> {
    if input.report_interval == Some(0) {
        return Err(AppError::Core(CoreError::Validation(
            "report_interval must be at least 1 second".to_string(),
        )));
    }
    input.group_name = input.group_name.map(normalize_group);

    let row = HostRepo::update(&state.pool, &server_id, &input)
        .await?
        .ok_or_else(|| CoreError::not_found("host", &server_id))?;
    let host = row.into_host();
    state.monitor.upsert_host(host.clone()).await;

    Ok(Json(DataResponse { data: host }))
}

/// DELETE /api/v1/servers/{id}
///
/// Rules that target the host stay stored but match nothing.
pub async fn remove(
    State(state): State<AppState>,
    Path(server_id): Path<String>,
) -> AppResult<StatusCode> {
    if !HostRepo::delete(&state.pool, &server_id).await? {
        return Err(CoreError::not_found("host", &server_id).into());
    }
    state.monitor.remove_host(&server_id).await;
    tracing::info!(server_id = %server_id, "Host removed");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/servers/groups/bulk
///
/// Each host is updated on its own; the report lists every outcome.
pub async fn bulk_reassign(
    State(state): State<AppState>,
    Json(input): Json<BulkGroupRequest>,
) -> AppResult<Json<DataResponse<BulkReport>>> {
    let targets = state.monitor.bulk_targets(&input).await?;
    let group = input.group();
    let mut report = BulkReport::new(group.clone());

    for server_id in targets {
        let result = match HostRepo::set_group(&state.pool, &server_id, group.as_deref()).await {
            Ok(Some(_)) => state
                .monitor
                .set_group(&server_id, group.clone())
                .await
                .map(|_| ())
                .map_err(AppError::from),
            Ok(None) => Err(CoreError::not_found("host", &server_id).into()),
            Err(e) => Err(AppError::from(e)),
        };
        report.record(server_id, result);
    }

    tracing::info!(
        group = ?report.group_name,
        succeeded = report.succeeded,
        failed = report.failed,
        "Bulk group reassignment finished"
    );
    Ok(Json(DataResponse { data: report }))
}
