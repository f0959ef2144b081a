//! Quiz answer hand-off between the connector and a waiting scheduler.
//!
//! The scheduler registers a one-shot waiter before posting a quiz; the
//! connector then submits the user's letters. Each waiter accepts exactly
//! one submission.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use sb_domain::quiz::AnswerChoice;
use sb_domain::UserId;

/// One entry per question; `None` is an unanswered or unreadable answer.
pub type Answers = Vec<Option<AnswerChoice>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("user {0} has no quiz awaiting answers")]
pub struct NoPendingQuiz(pub UserId);

#[derive(Default)]
pub struct AnswerBroker {
    waiters: Mutex<HashMap<UserId, oneshot::Sender<Answers>>>,
}

impl AnswerBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a waiter for the user's next submission, replacing any older one.
    pub fn register(&self, user_id: &UserId) -> oneshot::Receiver<Answers> {
        let (tx, rx) = oneshot::channel();
        self.waiters.lock().insert(user_id.clone(), tx);
        rx
    }

    /// Deliver answers to the user's waiter.
    pub fn submit(&self, user_id: &UserId, answers: Answers) -> Result<(), NoPendingQuiz> {
        let tx = self
            .waiters
            .lock()
            .remove(user_id)
            .ok_or_else(|| NoPendingQuiz(user_id.clone()))?;
        tx.send(answers).map_err(|_| NoPendingQuiz(user_id.clone()))
    }

    /// Close the user's waiter, if any.
    pub fn withdraw(&self, user_id: &UserId) {
        self.waiters.lock().remove(user_id);
    }

    pub fn is_waiting(&self, user_id: &UserId) -> bool {
        self.waiters
            .lock()
            .get(user_id)
            .is_some_and(|tx| !tx.is_closed())
    }
}

/// Parse free-form answer input such as `"ACB"`, `"a, c, b"` or `"A C B"`.
/// Characters other than letters and separators become unanswered slots.
pub fn parse_answer_letters(input: &str) -> Answers {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .map(|c| c.to_string().parse().ok())
        .collect()
}
