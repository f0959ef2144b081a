pub mod auth;
pub mod communities;
pub mod health;
pub mod presence;
pub mod sessions;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
///
/// Routes are split into **public** (no auth required) and **protected**
/// (gated behind the bearer-token middleware).
///
/// `state` is needed to wire up the auth middleware at build time.
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/v1/health", get(health::health));

    let protected = Router::new()
        // Study sessions
        .route(
            "/v1/sessions",
            post(sessions::start_session).get(sessions::list_sessions),
        )
        .route(
            "/v1/sessions/:user_id",
            get(sessions::get_session).delete(sessions::stop_session),
        )
        .route("/v1/sessions/:user_id/answers", post(sessions::submit_answers))
        // Connector presence ingress
        .route("/v1/presence", post(presence::presence_event))
        // Per-community settings
        .route(
            "/v1/communities/:community_id/config",
            get(communities::get_config).put(communities::put_config),
        )
        // Apply API auth middleware to all protected routes.
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::require_api_token,
        ));

    public.merge(protected)
}

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}
