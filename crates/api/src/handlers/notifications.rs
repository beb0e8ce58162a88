//! Diagnostics: send a test notification.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TestNotification {
    pub email: String,
}

/// Acknowledgement for a queued test notification.
#[derive(Debug, Serialize)]
pub struct TestQueued {
    pub id: Uuid,
    pub recipients: Vec<String>,
}

/// POST /api/v1/notifications/test
///
/// Queues the message for delivery and returns immediately. Delivery
/// failures show up in the logs, not in this response.
pub async fn send_test(
    State(state): State<AppState>,
    Json(input): Json<TestNotification>,
) -> AppResult<(StatusCode, Json<DataResponse<TestQueued>>)> {
    let request = state.monitor.send_test(&input.email, Utc::now())?;
    tracing::info!(request_id = %request.id, "Test notification queued");
    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: TestQueued {
                id: request.id,
                recipients: request.recipients,
            },
        }),
    ))
}
