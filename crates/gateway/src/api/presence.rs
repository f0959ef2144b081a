use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use tokio::sync::mpsc::error::TrySendError;

use sb_domain::transport::PresenceEvent;

use super::api_error;
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/presence
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Queue a presence change for the interrupt bridge. Never blocks on the
/// bridge: a full queue is reported back so the connector can retry.
pub async fn presence_event(
    State(state): State<AppState>,
    Json(event): Json<PresenceEvent>,
) -> Response {
    let user_id = event.user_id.clone();
    match state.presence_tx.try_send(event) {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "queued": true })),
        )
            .into_response(),
        Err(TrySendError::Full(_)) => {
            tracing::warn!(user_id = %user_id, "presence queue full, dropping event");
            api_error(StatusCode::SERVICE_UNAVAILABLE, "presence queue is full, retry later")
        }
        Err(TrySendError::Closed(_)) => {
            api_error(StatusCode::SERVICE_UNAVAILABLE, "server is shutting down")
        }
    }
}
