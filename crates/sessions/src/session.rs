//! The study session model.
//!
//! A [`StudySession`] is shared read-only through `Arc`. Its progress
//! (phase, cycle counter, quiz scores) can only be changed through the
//! single [`ProgressWriter`] handed out when the session is activated in
//! the registry, which the scheduler task owns.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::time::Instant;

use sb_domain::config::Timings;
use sb_domain::quiz::{Quiz, QuizScore};
use sb_domain::{ChannelId, CommunityId, UserId};

use crate::cancel::CancelToken;

/// Topic used when the start request does not name one.
pub const DEFAULT_TOPIC: &str = "General Study";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Phase
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    WorkPending,
    Working,
    Quizzing,
    OnBreak,
    Completed,
    Cancelled,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: Phase) -> bool {
        use Phase::*;
        match (self, next) {
            (Completed | Cancelled, _) => false,
            (_, Cancelled) => true,
            (WorkPending | OnBreak, Working) => true,
            (Working, Quizzing) => true,
            (Quizzing, OnBreak | Completed) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WorkPending => "work_pending",
            Self::Working => "working",
            Self::Quizzing => "quizzing",
            Self::OnBreak => "on_break",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Everything fixed at session creation.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: UserId,
    pub community_id: CommunityId,
    pub channel_id: ChannelId,
    pub topic: Option<String>,
    pub key_points: Vec<String>,
    pub target_cycles: u32,
    pub timings: Timings,
}

#[derive(Debug)]
struct Progress {
    phase: Phase,
    current_cycle: u32,
    quiz_scores: Vec<QuizScore>,
    current_quiz: Option<Quiz>,
}

#[derive(Debug)]
pub struct StudySession {
    id: String,
    user_id: UserId,
    community_id: CommunityId,
    channel_id: ChannelId,
    topic: String,
    key_points: Vec<String>,
    target_cycles: u32,
    timings: Timings,
    started_at: DateTime<Utc>,
    started: Instant,
    cancel: CancelToken,
    progress: RwLock<Progress>,
}

impl StudySession {
    pub fn new(params: NewSession) -> Self {
        let topic = params
            .topic
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TOPIC.to_string());
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: params.user_id,
            community_id: params.community_id,
            channel_id: params.channel_id,
            topic,
            key_points: params.key_points,
            target_cycles: params.target_cycles,
            timings: params.timings,
            started_at: Utc::now(),
            started: Instant::now(),
            cancel: CancelToken::new(),
            progress: RwLock::new(Progress {
                phase: Phase::WorkPending,
                current_cycle: 0,
                quiz_scores: Vec::new(),
                current_quiz: None,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn community_id(&self) -> &CommunityId {
        &self.community_id
    }

    pub fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn key_points(&self) -> &[String] {
        &self.key_points
    }

    pub fn target_cycles(&self) -> u32 {
        self.target_cycles
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn phase(&self) -> Phase {
        self.progress.read().phase
    }

    pub fn current_cycle(&self) -> u32 {
        self.progress.read().current_cycle
    }

    pub fn quiz_scores(&self) -> Vec<QuizScore> {
        self.progress.read().quiz_scores.clone()
    }

    pub fn current_quiz(&self) -> Option<Quiz> {
        self.progress.read().current_quiz.clone()
    }

    /// Mean score fraction over recorded quizzes, 0.0 when none.
    pub fn average_score(&self) -> f64 {
        average(&self.progress.read().quiz_scores)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let progress = self.progress.read();
        SessionSnapshot {
            session_id: self.id.clone(),
            user_id: self.user_id.clone(),
            community_id: self.community_id.clone(),
            channel_id: self.channel_id.clone(),
            topic: self.topic.clone(),
            key_points: self.key_points.clone(),
            phase: progress.phase,
            current_cycle: progress.current_cycle,
            target_cycles: self.target_cycles,
            quiz_scores: progress.quiz_scores.clone(),
            average_score: average(&progress.quiz_scores),
            awaiting_answers: progress.phase == Phase::Quizzing && progress.current_quiz.is_some(),
            started_at: self.started_at,
            elapsed_secs: self.elapsed().as_secs(),
        }
    }
}

fn average(scores: &[QuizScore]) -> f64 {
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().map(QuizScore::fraction).sum::<f64>() / scores.len() as f64
    }
}

/// Serializable point-in-time view of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub user_id: UserId,
    pub community_id: CommunityId,
    pub channel_id: ChannelId,
    pub topic: String,
    pub key_points: Vec<String>,
    pub phase: Phase,
    pub current_cycle: u32,
    pub target_cycles: u32,
    pub quiz_scores: Vec<QuizScore>,
    pub average_score: f64,
    pub awaiting_answers: bool,
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: u64,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Progress writer
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Exclusive mutation handle for a session's progress. Not `Clone`; the
/// registry creates exactly one per activated session.
#[derive(Debug)]
pub struct ProgressWriter {
    session: Arc<StudySession>,
}

impl ProgressWriter {
    pub(crate) fn new(session: Arc<StudySession>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<StudySession> {
        &self.session
    }

    fn transition(&self, progress: &mut Progress, next: Phase) {
        debug_assert!(
            progress.phase.can_transition_to(next),
            "invalid phase transition {:?} -> {:?}",
            progress.phase,
            next
        );
        progress.phase = next;
    }

    /// Advance to the next cycle and enter `Working`. Returns the new
    /// (1-based) cycle number.
    pub fn begin_work(&self) -> u32 {
        let mut progress = self.session.progress.write();
        debug_assert!(progress.current_cycle < self.session.target_cycles);
        progress.current_cycle += 1;
        self.transition(&mut progress, Phase::Working);
        progress.current_cycle
    }

    pub fn begin_quiz(&self) {
        let mut progress = self.session.progress.write();
        self.transition(&mut progress, Phase::Quizzing);
    }

    /// Store the quiz the user is currently answering.
    pub fn set_current_quiz(&self, quiz: Quiz) {
        self.session.progress.write().current_quiz = Some(quiz);
    }

    /// Append the finished quiz's score and clear the current quiz.
    pub fn record_score(&self, score: QuizScore) {
        let mut progress = self.session.progress.write();
        debug_assert_eq!(progress.phase, Phase::Quizzing);
        progress.quiz_scores.push(score);
        progress.current_quiz = None;
    }

    pub fn begin_break(&self) {
        let mut progress = self.session.progress.write();
        self.transition(&mut progress, Phase::OnBreak);
    }

    pub fn complete(&self) {
        let mut progress = self.session.progress.write();
        self.transition(&mut progress, Phase::Completed);
    }

    /// Enter `Cancelled`. A quiz in flight is discarded without a score.
    pub fn cancel(&self) {
        let mut progress = self.session.progress.write();
        if progress.phase.is_terminal() {
            return;
        }
        progress.phase = Phase::Cancelled;
        progress.current_quiz = None;
    }
}
