//! Handlers for the global alert config, active breaches and alert rules.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use hostwatch_core::alert::{AlertRule, NewAlertRule};
use hostwatch_core::engine::ActiveBreach;
use hostwatch_core::error::CoreError;
use hostwatch_core::thresholds::GlobalAlertConfig;
use hostwatch_core::types::DbId;
use hostwatch_db::repositories::{AlertConfigRepo, AlertRuleRepo};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/alerts/config
pub async fn get_config(State(state): State<AppState>) -> Json<DataResponse<GlobalAlertConfig>> {
    Json(DataResponse {
        data: state.monitor.global_config().await,
    })
}

/// PUT /api/v1/alerts/config
pub async fn update_config(
    State(state): State<AppState>,
    Json(input): Json<GlobalAlertConfig>,
) -> AppResult<Json<DataResponse<GlobalAlertConfig>>> {
    input.validate()?;
    let row = AlertConfigRepo::upsert(&state.pool, &input).await?;
    let config = row.to_config();
    state.monitor.set_global_config(config).await?;
    tracing::info!(?config, "Global alert config updated");
    Ok(Json(DataResponse { data: config }))
}

/// GET /api/v1/alerts/active
///
/// Every (host, alert type) pair currently in the breached state.
pub async fn active(State(state): State<AppState>) -> Json<DataResponse<Vec<ActiveBreach>>> {
    Json(DataResponse {
        data: state.monitor.active_breaches(),
    })
}

/// GET /api/v1/alert-rules
pub async fn list_rules(State(state): State<AppState>) -> Json<DataResponse<Vec<AlertRule>>> {
    Json(DataResponse {
        data: state.monitor.rules().await,
    })
}

/// POST /api/v1/alert-rules
pub async fn create_rule(
    State(state): State<AppState>,
    Json(input): Json<NewAlertRule>,
) -> AppResult<(StatusCode, Json<DataResponse<AlertRule>>)> {
    let rule = state.monitor.validate_rule(input).await?;
    let row = AlertRuleRepo::create(&state.pool, &rule).await?;
    let rule = AlertRule::try_from(row)?;
    state.monitor.add_rule(rule.clone()).await;

    tracing::info!(rule_id = rule.id, alert_type = %rule.alert_type, "Alert rule created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: rule })))
}

/// DELETE /api/v1/alert-rules/{id}
pub async fn delete_rule(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !AlertRuleRepo::delete(&state.pool, id).await? {
        return Err(CoreError::not_found("alert rule", id).into());
    }
    state.monitor.remove_rule(id).await;
    Ok(StatusCode::NO_CONTENT)
}
