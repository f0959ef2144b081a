//! Per-community settings.
//!
//! - `GET /v1/communities/:community_id/config` returns the stored settings
//!   (defaults are persisted on first access)
//! - `PUT /v1/communities/:community_id/config` applies a partial update

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use sb_domain::config::TimingOverrides;
use sb_domain::CommunityId;

use super::api_error;
use crate::state::AppState;

pub async fn get_config(
    State(state): State<AppState>,
    Path(community_id): Path<String>,
) -> impl IntoResponse {
    let id = CommunityId::from(community_id);
    Json(state.runtime.communities.load(&id).await)
}

/// Fields left out keep their current value. An empty `study_channel_id`
/// clears the explicit id so matching falls back to the name.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateConfigBody {
    #[serde(default)]
    pub study_channel_id: Option<String>,
    #[serde(default)]
    pub study_channel_name: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub max_session_duration_mins: Option<u32>,
    #[serde(default)]
    pub timings: Option<TimingOverrides>,
}

pub async fn put_config(
    State(state): State<AppState>,
    Path(community_id): Path<String>,
    Json(body): Json<UpdateConfigBody>,
) -> Response {
    if let Err(msg) = check_update(&body) {
        return api_error(StatusCode::BAD_REQUEST, msg);
    }

    let id = CommunityId::from(community_id);
    let mut cfg = state.runtime.communities.load(&id).await;
    if let Some(channel_id) = body.study_channel_id {
        cfg.study_channel_id = Some(channel_id.trim().to_string()).filter(|s| !s.is_empty());
    }
    if let Some(name) = body.study_channel_name {
        cfg.study_channel_name = name.trim().to_string();
    }
    if let Some(prefix) = body.prefix {
        cfg.prefix = prefix;
    }
    if let Some(mins) = body.max_session_duration_mins {
        cfg.max_session_duration_mins = mins;
    }
    if let Some(timings) = body.timings {
        cfg.timings = timings;
    }

    match state.runtime.communities.save(&id, cfg).await {
        Ok(saved) => Json(saved).into_response(),
        Err(e) => {
            tracing::error!(community_id = %id, error = %e, "failed to persist community config");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to save config: {e}"),
            )
        }
    }
}

fn check_update(body: &UpdateConfigBody) -> Result<(), String> {
    if body
        .study_channel_name
        .as_deref()
        .is_some_and(|n| n.trim().is_empty())
    {
        return Err("study_channel_name must not be empty".into());
    }
    if body.prefix.as_deref().is_some_and(str::is_empty) {
        return Err("prefix must not be empty".into());
    }
    if body.max_session_duration_mins == Some(0) {
        return Err("max_session_duration_mins must be > 0".into());
    }
    if body.timings.is_some_and(|t| t.has_zero()) {
        return Err("timing overrides must be > 0".into());
    }
    Ok(())
}
