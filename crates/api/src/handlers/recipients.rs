//! Handlers for always-notify recipients.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use hostwatch_core::alert::{NewRecipient, Recipient};
use hostwatch_core::error::CoreError;
use hostwatch_core::types::DbId;
use hostwatch_db::repositories::RecipientRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/recipients
pub async fn list(State(state): State<AppState>) -> Json<DataResponse<Vec<Recipient>>> {
    Json(DataResponse {
        data: state.monitor.recipients().await,
    })
}

/// POST /api/v1/recipients
///
/// Emails are unique; a duplicate returns 409.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewRecipient>,
) -> AppResult<(StatusCode, Json<DataResponse<Recipient>>)> {
    let input = input.validate()?;
    let row = RecipientRepo::create(&state.pool, &input).await?;
    let recipient = Recipient::try_from(row)?;
    state.monitor.add_recipient(recipient.clone()).await;
    Ok((StatusCode::CREATED, Json(DataResponse { data: recipient })))
}

/// DELETE /api/v1/recipients/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !RecipientRepo::delete(&state.pool, id).await? {
        return Err(CoreError::not_found("recipient", id).into());
    }
    state.monitor.remove_recipient(id).await;
    Ok(StatusCode::NO_CONTENT)
}
