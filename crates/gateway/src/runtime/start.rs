//! Start and stop flows for study sessions.
//!
//! A start passes, in order: validation, the per-user cooldown, and the
//! registry reservation. Only then does slow work happen (moving the user,
//! summarizing content), and the reservation guarantees a concurrent start
//! for the same user is rejected meanwhile.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use sb_content::{extract_text_async, FileKind};
use sb_domain::config::TimingOverrides;
use sb_domain::notice::Notice;
use sb_domain::trace::TraceEvent;
use sb_domain::transport::NoticeTarget;
use sb_domain::{ChannelId, CommunityId, UserId};
use sb_sessions::{AlreadyActive, CancelReason, NewSession, StudySession};

use super::rate_limit::RateDecision;
use super::scheduler::{PomodoroScheduler, SessionOutcome};
use super::StudyRuntime;

/// An uploaded file with study material.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct StartRequest {
    pub user_id: UserId,
    pub community_id: CommunityId,
    /// Where notices for this session are posted.
    pub channel_id: ChannelId,
    pub cycles: u32,
    pub topic: Option<String>,
    pub text: Option<String>,
    pub attachment: Option<Attachment>,
    /// Highest-precedence timing overrides.
    pub timings: TimingOverrides,
}

#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    AlreadyActive(#[from] AlreadyActive),
    #[error("please wait {}s before starting another session", .remaining.as_secs().max(1))]
    RateLimited { remaining: Duration },
}

impl StartError {
    fn reason(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::AlreadyActive(_) => "already_active",
            Self::RateLimited { .. } => "rate_limited",
        }
    }
}

/// A freshly started session and the task driving it.
#[derive(Debug)]
pub struct Started {
    pub session: Arc<StudySession>,
    pub handle: JoinHandle<SessionOutcome>,
    /// True when content analysis fell back to its placeholder.
    pub degraded: bool,
}

pub async fn start_session(rt: &StudyRuntime, req: StartRequest) -> Result<Started, StartError> {
    let result = try_start(rt, req.clone()).await;
    if let Err(e) = &result {
        tracing::info!(user_id = %req.user_id, error = %e, "study session start rejected");
        TraceEvent::StartRejected {
            user_id: req.user_id.to_string(),
            reason: e.reason().into(),
        }
        .emit();
    }
    result
}

async fn try_start(rt: &StudyRuntime, req: StartRequest) -> Result<Started, StartError> {
    // 1. Validate.
    let (min, max) = (rt.pomodoro.min_cycles, rt.pomodoro.max_cycles);
    if req.cycles < min || req.cycles > max {
        return Err(StartError::Validation(format!(
            "cycles must be between {min} and {max}"
        )));
    }
    if req.timings.has_zero() {
        return Err(StartError::Validation("timing overrides must be > 0".into()));
    }
    let content = study_content(&req).await?;

    // 2. Cooldown.
    if let RateDecision::Denied { remaining } = rt
        .rate_limiter
        .check_and_record(&req.user_id, rt.pomodoro.start_cooldown())
    {
        return Err(StartError::RateLimited { remaining });
    }

    // 3. Claim the user's slot.
    let reservation = rt.registry.try_reserve(&req.user_id)?;

    // 4. Community settings and the move into the monitored space.
    let community = rt.communities.load(&req.community_id).await;
    let target = NoticeTarget {
        community_id: req.community_id.clone(),
        channel_id: req.channel_id.clone(),
        user_id: req.user_id.clone(),
    };
    let space = community.monitored_space();
    match rt
        .transport
        .move_user_to(&req.user_id, &req.community_id, &space)
        .await
    {
        Ok(location) => rt
            .presence
            .record(&req.user_id, &req.community_id, Some(location)),
        Err(e) => {
            tracing::warn!(user_id = %req.user_id, space = %space.name, error = %e, "move into study space failed");
            let notice = Notice::MoveFailed {
                space: space.name.clone(),
                error: e.to_string(),
            };
            if let Err(e) = rt.transport.notify(&target, &notice).await {
                tracing::warn!(user_id = %req.user_id, error = %e, "failed to deliver notice");
            }
        }
    }

    // 5. Analyze, build, activate, announce, spawn.
    let summary = rt.content.summarize(&content).await;
    let degraded = summary.is_fallback();
    let key_points = summary.into_value();

    let timings = rt
        .pomodoro
        .timings()
        .with_overrides(&community.timings)
        .with_overrides(&req.timings);

    let session = StudySession::new(NewSession {
        user_id: req.user_id.clone(),
        community_id: req.community_id.clone(),
        channel_id: req.channel_id.clone(),
        topic: req.topic.clone(),
        key_points,
        target_cycles: req.cycles,
        timings,
    });
    let (session, writer) = reservation.activate(session);

    let started = Notice::SessionStarted {
        topic: session.topic().to_string(),
        key_points: session.key_points().to_vec(),
        cycles: session.target_cycles(),
        degraded,
    };
    if let Err(e) = rt.transport.notify(&target, &started).await {
        tracing::warn!(session_id = %session.id(), error = %e, "failed to deliver notice");
    }

    TraceEvent::SessionStarted {
        user_id: req.user_id.to_string(),
        community_id: req.community_id.to_string(),
        session_id: session.id().to_string(),
        cycles: req.cycles,
        key_points: session.key_points().len(),
    }
    .emit();
    tracing::info!(
        session_id = %session.id(),
        user_id = %req.user_id,
        community_id = %req.community_id,
        cycles = req.cycles,
        work_secs = timings.work.as_secs(),
        degraded,
        "study session started"
    );

    let handle = PomodoroScheduler::new(rt.clone(), writer).spawn();
    Ok(Started {
        session,
        handle,
        degraded,
    })
}

/// The text to study: the attachment's extracted text if one was sent,
/// otherwise the inline text.
async fn study_content(req: &StartRequest) -> Result<String, StartError> {
    let text = match &req.attachment {
        Some(file) => {
            let kind = FileKind::from_filename(&file.filename);
            if kind == FileKind::Unsupported {
                return Err(StartError::Validation(format!(
                    "unsupported file type: {} (use .txt, .md or .pdf)",
                    file.filename
                )));
            }
            match extract_text_async(file.bytes.clone(), kind).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(user_id = %req.user_id, file = %file.filename, error = %e, "text extraction failed");
                    String::new()
                }
            }
        }
        None => req.text.clone().unwrap_or_default(),
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(StartError::Validation("no study content provided".into()));
    }
    Ok(text.to_string())
}

/// Ask the user's session to stop, including one still being started.
/// Returns whether one existed.
pub fn stop_session(rt: &StudyRuntime, user_id: &UserId) -> bool {
    rt.registry.request_cancel(user_id, CancelReason::Stopped)
}
