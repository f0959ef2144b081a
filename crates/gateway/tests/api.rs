//! HTTP surface: routing, auth, and status-code mapping.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use sb_content::ContentPipeline;
use sb_domain::config::{CommunityDefaults, Config, PomodoroConfig};
use sb_domain::transport::PresenceEvent;
use sb_gateway::api;
use sb_gateway::community::{ConfigCache, JsonCommunityStore};
use sb_gateway::runtime::StudyRuntime;
use sb_gateway::state::AppState;
use sb_gateway::transport::LogTransport;

const TOKEN: &str = "test-token";

struct TestApp {
    app: Router,
    state: AppState,
    _presence_rx: mpsc::Receiver<PresenceEvent>,
    _dir: TempDir,
}

fn test_app(token: Option<&str>, pomodoro: PomodoroConfig) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonCommunityStore::open(dir.path()).unwrap());
    let cache = Arc::new(ConfigCache::new(store, CommunityDefaults::default()));
    let runtime = StudyRuntime::new(
        pomodoro,
        cache,
        ContentPipeline::offline(),
        Arc::new(LogTransport),
    );
    let (presence_tx, presence_rx) = mpsc::channel(1);

    let state = AppState {
        config: Arc::new(Config::default()),
        runtime,
        presence_tx,
        shutdown: CancellationToken::new(),
        api_token_hash: token.map(|t| Sha256::digest(t.as_bytes()).to_vec()),
        started_at: tokio::time::Instant::now(),
    };
    TestApp {
        app: api::router(state.clone()).with_state(state.clone()),
        state,
        _presence_rx: presence_rx,
        _dir: dir,
    }
}

fn open_app() -> TestApp {
    test_app(None, PomodoroConfig::default())
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    call_with_token(app, method, uri, body, None).await
}

async fn call_with_token(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

fn start_body(user: &str, cycles: u32) -> Value {
    json!({
        "user_id": user,
        "community_id": "guild-1",
        "channel_id": "text-1",
        "cycles": cycles,
        "text": "Photosynthesis converts light into chemical energy.",
    })
}

// ── Auth ────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_is_public_even_with_a_token() {
    let t = test_app(Some(TOKEN), PomodoroConfig::default());
    let (status, body) = call(&t.app, Method::GET, "/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["active_sessions"], 0);
}

#[tokio::test]
async fn protected_routes_require_the_bearer_token() {
    let t = test_app(Some(TOKEN), PomodoroConfig::default());

    let (status, _) = call(&t.app, Method::GET, "/v1/sessions", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) =
        call_with_token(&t.app, Method::GET, "/v1/sessions", None, Some("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) =
        call_with_token(&t.app, Method::GET, "/v1/sessions", None, Some(TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
}

// ── Sessions ────────────────────────────────────────────────────────

#[tokio::test]
async fn start_inspect_and_stop_a_session() {
    let t = open_app();

    let (status, body) = call(&t.app, Method::POST, "/v1/sessions", Some(start_body("u1", 2))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user_id"], "u1");
    assert_eq!(body["target_cycles"], 2);
    assert_eq!(body["topic"], "General Study");
    assert_eq!(body["degraded"], true);

    let (status, body) = call(&t.app, Method::GET, "/v1/sessions/u1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["community_id"], "guild-1");

    let (status, body) = call(&t.app, Method::GET, "/v1/sessions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, _) = call(&t.app, Method::DELETE, "/v1/sessions/u1", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let session = t.state.runtime.registry.get(&"u1".into());
    assert!(session.map_or(true, |s| s.cancel_token().is_cancelled()));
}

#[tokio::test]
async fn unknown_session_is_404() {
    let t = open_app();
    let (status, _) = call(&t.app, Method::GET, "/v1/sessions/nobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&t.app, Method::DELETE, "/v1/sessions/nobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn start_errors_map_to_status_codes() {
    let t = open_app();

    let (status, body) = call(&t.app, Method::POST, "/v1/sessions", Some(start_body("u1", 9))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("cycles"));

    let mut no_content = start_body("u1", 2);
    no_content["text"] = json!("   ");
    let (status, _) = call(&t.app, Method::POST, "/v1/sessions", Some(no_content)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut zero_work = start_body("u1", 2);
    zero_work["work_secs"] = json!(0);
    let (status, body) = call(&t.app, Method::POST, "/v1/sessions", Some(zero_work)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("timing"));

    let (status, _) = call(&t.app, Method::POST, "/v1/sessions", Some(start_body("u1", 2))).await;
    assert_eq!(status, StatusCode::CREATED);

    // Cooldown is checked before the registry.
    let (status, body) = call(&t.app, Method::POST, "/v1/sessions", Some(start_body("u1", 2))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["remaining_secs"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn second_start_without_cooldown_conflicts() {
    let pomodoro = PomodoroConfig {
        start_cooldown_secs: 0,
        ..PomodoroConfig::default()
    };
    let t = test_app(None, pomodoro);

    let (status, _) = call(&t.app, Method::POST, "/v1/sessions", Some(start_body("u1", 2))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = call(&t.app, Method::POST, "/v1/sessions", Some(start_body("u1", 2))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn attachment_is_decoded_from_base64() {
    let t = open_app();

    let mut body = start_body("u1", 1);
    body["text"] = Value::Null;
    body["attachment"] = json!({
        "filename": "notes.txt",
        // "Mitochondria make ATP."
        "content_base64": "TWl0b2Nob25kcmlhIG1ha2UgQVRQLg==",
    });
    let (status, _) = call(&t.app, Method::POST, "/v1/sessions", Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let mut bad = start_body("u2", 1);
    bad["attachment"] = json!({ "filename": "notes.txt", "content_base64": "not base64!!" });
    let (status, _) = call(&t.app, Method::POST, "/v1/sessions", Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut unsupported = start_body("u3", 1);
    unsupported["attachment"] = json!({ "filename": "slides.pptx", "content_base64": "AAAA" });
    let (status, body) = call(&t.app, Method::POST, "/v1/sessions", Some(unsupported)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("unsupported"));
}

#[tokio::test]
async fn answers_without_a_pending_quiz_conflict() {
    let t = open_app();
    let (status, _) = call(
        &t.app,
        Method::POST,
        "/v1/sessions/u1/answers",
        Some(json!({ "answers": ["A", "B"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn answers_reach_a_waiting_quiz() {
    let t = open_app();
    let rx = t.state.runtime.answers.register(&"u1".into());

    let (status, _) = call(
        &t.app,
        Method::POST,
        "/v1/sessions/u1/answers",
        Some(json!({ "answers": ["a", "Z"] })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let answers = rx.await.unwrap();
    assert_eq!(answers.len(), 2);
    assert!(answers[0].is_some());
    assert!(answers[1].is_none());
}

// ── Presence ────────────────────────────────────────────────────────

#[tokio::test]
async fn presence_is_queued_until_the_buffer_fills() {
    let t = open_app();
    let event = json!({
        "user_id": "u1",
        "community_id": "guild-1",
        "current": { "id": "vc-1", "name": "general" },
    });

    let (status, _) = call(&t.app, Method::POST, "/v1/presence", Some(event.clone())).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    // Nothing drains the channel in this test, so the second event bounces.
    let (status, _) = call(&t.app, Method::POST, "/v1/presence", Some(event)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

// ── Community config ────────────────────────────────────────────────

#[tokio::test]
async fn community_config_defaults_then_partial_update() {
    let t = open_app();
    let uri = "/v1/communities/guild-1/config";

    let (status, body) = call(&t.app, Method::GET, uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["study_channel_name"], "study-vc");
    assert_eq!(body["prefix"], "!");

    let (status, body) = call(
        &t.app,
        Method::PUT,
        uri,
        Some(json!({ "study_channel_name": "focus-room", "timings": { "work_secs": 600 } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["study_channel_name"], "focus-room");
    assert_eq!(body["prefix"], "!");
    assert_eq!(body["timings"]["work_secs"], 600);
    assert!(body["updated_at"].is_string());

    let (status, _) = call(
        &t.app,
        Method::PUT,
        uri,
        Some(json!({ "study_channel_name": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = call(&t.app, Method::GET, uri, None).await;
    assert_eq!(body["study_channel_name"], "focus-room");
}
