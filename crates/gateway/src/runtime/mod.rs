//! Study session runtime: start flow, Pomodoro scheduler, quiz sub-protocol
//! and the presence-driven interrupt bridge.

pub mod answers;
pub mod interrupt;
pub mod presence;
pub mod quiz;
pub mod rate_limit;
pub mod scheduler;
pub mod start;

use std::sync::Arc;

use sb_content::ContentPipeline;
use sb_domain::config::PomodoroConfig;
use sb_domain::transport::Transport;
use sb_sessions::SessionRegistry;

use crate::community::ConfigCache;

pub use answers::{parse_answer_letters, AnswerBroker, Answers, NoPendingQuiz};
pub use interrupt::InterruptBridge;
pub use presence::PresenceTracker;
pub use rate_limit::{RateDecision, RateLimiter};
pub use scheduler::{PomodoroScheduler, SessionOutcome};
pub use start::{start_session, stop_session, Attachment, StartError, StartRequest, Started};

/// Shared services behind every study session.
///
/// Cheap to clone; all fields are reference-counted.
#[derive(Clone)]
pub struct StudyRuntime {
    pub pomodoro: Arc<PomodoroConfig>,
    pub registry: Arc<SessionRegistry>,
    pub rate_limiter: Arc<RateLimiter>,
    pub presence: Arc<PresenceTracker>,
    pub answers: Arc<AnswerBroker>,
    pub communities: Arc<ConfigCache>,
    pub content: ContentPipeline,
    pub transport: Arc<dyn Transport>,
}

impl StudyRuntime {
    pub fn new(
        pomodoro: PomodoroConfig,
        communities: Arc<ConfigCache>,
        content: ContentPipeline,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            pomodoro: Arc::new(pomodoro),
            registry: Arc::new(SessionRegistry::new()),
            rate_limiter: Arc::new(RateLimiter::new()),
            presence: Arc::new(PresenceTracker::new()),
            answers: Arc::new(AnswerBroker::new()),
            communities,
            content,
            transport,
        }
    }
}
