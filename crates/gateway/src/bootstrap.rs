//! Runtime construction shared by `serve` and `console`, plus the
//! background tasks the server runs alongside the HTTP listener.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sha2::{Digest, Sha256};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use sb_content::ContentPipeline;
use sb_domain::config::{Config, ConfigSeverity};
use sb_domain::transport::{PresenceEvent, Transport};
use sb_sessions::CancelReason;

use crate::community::{ConfigCache, JsonCommunityStore};
use crate::runtime::{InterruptBridge, StudyRuntime};
use crate::state::AppState;

/// Log every config issue; fail if any is an error.
pub fn check_config(config: &Config) -> anyhow::Result<()> {
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let errors = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if errors > 0 {
        anyhow::bail!("config validation failed with {errors} error(s)");
    }
    Ok(())
}

/// Build the session runtime on top of the given transport.
pub fn build_runtime(config: &Config, transport: Arc<dyn Transport>) -> anyhow::Result<StudyRuntime> {
    // ── Community settings ───────────────────────────────────────────
    let store = Arc::new(
        JsonCommunityStore::open(&config.storage.state_path)
            .context("opening community store")?,
    );
    let communities = Arc::new(ConfigCache::new(store, config.community_defaults.clone()));

    // ── Content pipeline ─────────────────────────────────────────────
    let provider = match sb_providers::create_provider(&config.llm) {
        Ok(provider) => provider,
        Err(e) => {
            tracing::warn!(
                error = %e,
                "LLM provider unavailable, summaries and quizzes will use fallbacks"
            );
            None
        }
    };
    match &provider {
        Some(p) => tracing::info!(provider = %p.provider_id(), model = %p.model(), "LLM provider ready"),
        None => tracing::info!("content pipeline running without an LLM provider"),
    }
    let content = ContentPipeline::new(provider);

    let runtime = StudyRuntime::new(config.pomodoro.clone(), communities, content, transport);
    tracing::info!(
        work_secs = config.pomodoro.work_secs,
        min_cycles = config.pomodoro.min_cycles,
        max_cycles = config.pomodoro.max_cycles,
        "session runtime ready"
    );
    Ok(runtime)
}

/// Receiving end of the presence channel, consumed by
/// [`spawn_background_tasks`].
pub struct PresenceInbox(mpsc::Receiver<PresenceEvent>);

/// Validate config and wire everything the HTTP server needs.
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<(AppState, PresenceInbox)> {
    check_config(&config)?;

    let transport = crate::transport::from_config(&config.transport)
        .context("initializing connector transport")?;
    let runtime = build_runtime(&config, transport)?;

    let (presence_tx, presence_rx) = mpsc::channel(config.transport.presence_buffer);

    // ── API token ────────────────────────────────────────────────────
    let env_var = &config.server.api_token_env;
    let api_token_hash = match std::env::var(env_var).ok().filter(|t| !t.is_empty()) {
        Some(token) => {
            tracing::info!(source = %format!("env:{env_var}"), "API bearer-token auth enabled");
            Some(Sha256::digest(token.as_bytes()).to_vec())
        }
        None => {
            tracing::warn!("API bearer-token auth DISABLED, set the {env_var} env var to enable it");
            None
        }
    };

    let state = AppState {
        config,
        runtime,
        presence_tx,
        shutdown: CancellationToken::new(),
        api_token_hash,
        started_at: tokio::time::Instant::now(),
    };
    Ok((state, PresenceInbox(presence_rx)))
}

/// Spawn the interrupt bridge and periodic housekeeping. Both stop when
/// `state.shutdown` fires.
pub fn spawn_background_tasks(state: &AppState, inbox: PresenceInbox) -> JoinHandle<()> {
    let bridge = InterruptBridge::new(state.runtime.clone())
        .spawn(inbox.0, state.shutdown.clone());

    // ── Periodic cooldown and presence pruning ───────────────────────
    {
        let limiter = state.runtime.rate_limiter.clone();
        let presence = state.runtime.presence.clone();
        let registry = state.runtime.registry.clone();
        let cooldown = state.runtime.pomodoro.start_cooldown();
        let shutdown = state.shutdown.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(600));
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        let removed = limiter.prune(cooldown);
                        if removed > 0 {
                            tracing::debug!(removed, "pruned expired start cooldowns");
                        }
                        let removed = presence.prune(|user| registry.contains(user));
                        if removed > 0 {
                            tracing::debug!(removed, "pruned presence of users without a session");
                        }
                    }
                }
            }
        });
    }

    tracing::info!("background tasks spawned");
    bridge
}

/// Cancel every live session and wait (bounded) for their schedulers to
/// announce the cancellation and release them.
pub async fn drain_sessions(runtime: &StudyRuntime, grace: Duration) {
    let signalled = runtime.registry.cancel_all(CancelReason::Shutdown);
    if signalled == 0 {
        return;
    }
    tracing::info!(sessions = signalled, "cancelling active study sessions");

    let deadline = tokio::time::Instant::now() + grace;
    while !runtime.registry.is_empty() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    if !runtime.registry.is_empty() {
        tracing::warn!(
            remaining = runtime.registry.len(),
            "sessions still active after shutdown grace period"
        );
    }
}
