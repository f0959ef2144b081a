//! Study session endpoints.
//!
//! - `POST   /v1/sessions`                   start a session
//! - `GET    /v1/sessions`                   list live sessions
//! - `GET    /v1/sessions/:user_id`          snapshot of one session
//! - `DELETE /v1/sessions/:user_id`          stop a session
//! - `POST   /v1/sessions/:user_id/answers`  answer the pending quiz

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use base64::Engine as _;
use serde::Deserialize;

use sb_domain::config::TimingOverrides;
use sb_domain::{ChannelId, CommunityId, UserId};

use super::api_error;
use crate::runtime::{self, Answers, Attachment, StartError, StartRequest};
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/sessions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct StartSessionBody {
    pub user_id: UserId,
    pub community_id: CommunityId,
    /// Channel the connector wants notices posted to.
    pub channel_id: ChannelId,
    pub cycles: u32,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attachment: Option<AttachmentBody>,
    #[serde(default, flatten)]
    pub timings: TimingOverrides,
}

#[derive(Debug, Deserialize)]
pub struct AttachmentBody {
    pub filename: String,
    pub content_base64: String,
}

pub async fn start_session(
    State(state): State<AppState>,
    Json(body): Json<StartSessionBody>,
) -> Response {
    let attachment = match body.attachment {
        Some(file) => match base64::engine::general_purpose::STANDARD.decode(&file.content_base64) {
            Ok(bytes) => Some(Attachment {
                filename: file.filename,
                bytes,
            }),
            Err(e) => {
                return api_error(
                    StatusCode::BAD_REQUEST,
                    format!("attachment is not valid base64: {e}"),
                )
            }
        },
        None => None,
    };

    let req = StartRequest {
        user_id: body.user_id,
        community_id: body.community_id,
        channel_id: body.channel_id,
        cycles: body.cycles,
        topic: body.topic,
        text: body.text,
        attachment,
        timings: body.timings,
    };

    match runtime::start_session(&state.runtime, req).await {
        Ok(started) => {
            let mut snapshot = serde_json::to_value(started.session.snapshot())
                .unwrap_or_else(|_| serde_json::json!({}));
            snapshot["degraded"] = serde_json::Value::Bool(started.degraded);
            (StatusCode::CREATED, Json(snapshot)).into_response()
        }
        Err(e @ StartError::Validation(_)) => api_error(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e @ StartError::AlreadyActive(_)) => api_error(StatusCode::CONFLICT, e.to_string()),
        Err(StartError::RateLimited { remaining }) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "error": format!("please wait {}s before starting another session", remaining.as_secs().max(1)),
                "remaining_secs": remaining.as_secs().max(1),
            })),
        )
            .into_response(),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/sessions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let sessions: Vec<_> = state
        .runtime
        .registry
        .list()
        .iter()
        .map(|s| s.snapshot())
        .collect();
    let count = sessions.len();
    Json(serde_json::json!({
        "sessions": sessions,
        "count": count,
    }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/sessions/:user_id
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn get_session(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Response {
    match state.runtime.registry.get(&UserId::from(user_id.as_str())) {
        Some(session) => Json(session.snapshot()).into_response(),
        None => api_error(StatusCode::NOT_FOUND, "no active session for this user"),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DELETE /v1/sessions/:user_id
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Request a stop. The scheduler posts the cancellation notice itself once
/// it observes the flag.
pub async fn stop_session(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Response {
    let user_id = UserId::from(user_id.as_str());
    if runtime::stop_session(&state.runtime, &user_id) {
        tracing::info!(user_id = %user_id, "stop requested via API");
        (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "stopping": true })),
        )
            .into_response()
    } else {
        api_error(StatusCode::NOT_FOUND, "no active session for this user")
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/sessions/:user_id/answers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct AnswersBody {
    /// One letter per question, in order. Anything that is not A-D counts
    /// as unanswered.
    pub answers: Vec<String>,
}

pub async fn submit_answers(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<AnswersBody>,
) -> Response {
    let user_id = UserId::from(user_id.as_str());
    let answers: Answers = body
        .answers
        .iter()
        .map(|letter| letter.trim().parse().ok())
        .collect();

    match state.runtime.answers.submit(&user_id, answers) {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "accepted": true })),
        )
            .into_response(),
        Err(e) => api_error(StatusCode::CONFLICT, e.to_string()),
    }
}
