//! Quiz sub-protocol run once per completed work phase.
//!
//! Generate (or fall back), post, wait a bounded time for answers, grade.
//! Every step is interruptible by the session's cancel token.

use sb_domain::notice::Notice;
use sb_domain::quiz::QuizScore;
use sb_domain::transport::NoticeTarget;
use sb_sessions::ProgressWriter;

use super::StudyRuntime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizResult {
    Answered(QuizScore),
    /// No answers arrived in time; scored as zero.
    TimedOut(QuizScore),
    Cancelled,
}

pub(crate) async fn run_quiz(
    rt: &StudyRuntime,
    writer: &ProgressWriter,
    target: &NoticeTarget,
    cycle: u32,
) -> QuizResult {
    let session = writer.session();
    let cancel = session.cancel_token();

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => return QuizResult::Cancelled,
        outcome = rt.content.generate_quiz(session.key_points()) => outcome,
    };
    if outcome.is_fallback() {
        tracing::debug!(session_id = %session.id(), cycle, "using fallback quiz");
    }
    let quiz = outcome.into_value();
    writer.set_current_quiz(quiz.clone());

    // Register before posting so an instant reply cannot be lost.
    let waiter = rt.answers.register(session.user_id());

    let posted = Notice::QuizPosted {
        cycle,
        questions: quiz.questions.clone(),
        answer_timeout_secs: rt.pomodoro.quiz_answer_timeout_secs,
    };
    if let Err(e) = rt.transport.notify(target, &posted).await {
        tracing::warn!(session_id = %session.id(), cycle, error = %e, "failed to post quiz");
    }

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => QuizResult::Cancelled,
        received = tokio::time::timeout(rt.pomodoro.quiz_answer_timeout(), waiter) => match received {
            Ok(Ok(answers)) => QuizResult::Answered(quiz.grade(&answers)),
            Ok(Err(_)) | Err(_) => QuizResult::TimedOut(QuizScore::zero(quiz.len())),
        },
    };

    rt.answers.withdraw(session.user_id());
    result
}
