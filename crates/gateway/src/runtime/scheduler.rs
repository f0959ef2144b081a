//! Pomodoro scheduler: one task per session driving
//! work → quiz → break → work … until completion or cancellation.
//!
//! The task suspends only in the work sleep, the break sleep and the quiz
//! wait. All three race the session's cancel token, so a stop or interrupt
//! takes effect immediately. Whatever the outcome, the session is removed
//! from the registry before the task ends.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;

use sb_domain::notice::Notice;
use sb_domain::trace::TraceEvent;
use sb_domain::transport::NoticeTarget;
use sb_sessions::{CancelReason, Phase, ProgressWriter, StudySession};

use super::quiz::{run_quiz, QuizResult};
use super::StudyRuntime;

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SessionOutcome {
    Completed {
        cycles: u32,
        average_score: f64,
        elapsed_secs: u64,
    },
    Cancelled {
        reason: CancelReason,
        completed_cycles: u32,
    },
}

impl SessionOutcome {
    fn label(&self) -> String {
        match self {
            Self::Completed { .. } => "completed".into(),
            Self::Cancelled { reason, .. } => format!("cancelled:{}", serde_label(reason)),
        }
    }
}

fn serde_label(reason: &CancelReason) -> String {
    serde_json::to_value(reason)
        .ok()
        .and_then(|v| v.as_str().map(String::from))
        .unwrap_or_default()
}

pub struct PomodoroScheduler {
    rt: StudyRuntime,
    writer: ProgressWriter,
    target: NoticeTarget,
}

impl PomodoroScheduler {
    pub fn new(rt: StudyRuntime, writer: ProgressWriter) -> Self {
        let session = writer.session();
        let target = NoticeTarget {
            community_id: session.community_id().clone(),
            channel_id: session.channel_id().clone(),
            user_id: session.user_id().clone(),
        };
        Self { rt, writer, target }
    }

    pub fn spawn(self) -> JoinHandle<SessionOutcome> {
        tokio::spawn(self.run())
    }

    /// Drive the session to its end, announce the result and release it.
    pub async fn run(self) -> SessionOutcome {
        let outcome = self.drive().await;
        self.finish(&outcome).await;
        outcome
    }

    fn session(&self) -> &Arc<StudySession> {
        self.writer.session()
    }

    async fn drive(&self) -> SessionOutcome {
        let session = self.session();
        let timings = *session.timings();
        let target = session.target_cycles();

        loop {
            if session.cancel_token().is_cancelled() {
                return self.cancelled();
            }

            // ── Work ───────────────────────────────────────────────────
            let cycle = self.writer.begin_work();
            self.phase_entered(Phase::Working, cycle);
            self.notify(Notice::WorkStarted {
                cycle,
                target,
                work_secs: timings.work.as_secs(),
            })
            .await;
            if !self.sleep(timings.work).await {
                return self.cancelled();
            }

            if !self.user_present().await {
                tracing::info!(
                    session_id = %session.id(),
                    user_id = %session.user_id(),
                    cycle,
                    "user left the study space during work, ending session"
                );
                session.cancel_token().cancel(CancelReason::PresenceLost);
                return self.cancelled();
            }

            // ── Quiz ───────────────────────────────────────────────────
            self.writer.begin_quiz();
            self.phase_entered(Phase::Quizzing, cycle);
            let (score, timed_out) = match run_quiz(&self.rt, &self.writer, &self.target, cycle).await {
                QuizResult::Answered(score) => (score, false),
                QuizResult::TimedOut(score) => (score, true),
                QuizResult::Cancelled => return self.cancelled(),
            };
            self.writer.record_score(score);
            TraceEvent::QuizScored {
                session_id: session.id().to_string(),
                cycle,
                correct: score.correct,
                total: score.total,
                timed_out,
            }
            .emit();
            let notice = if timed_out {
                Notice::QuizTimedOut { cycle }
            } else {
                Notice::QuizScored {
                    cycle,
                    correct: score.correct,
                    total: score.total,
                }
            };
            self.notify(notice).await;

            // ── Break or finish ────────────────────────────────────────
            let Some((kind, duration)) = timings.break_after(cycle, target) else {
                self.writer.complete();
                return SessionOutcome::Completed {
                    cycles: target,
                    average_score: session.average_score(),
                    elapsed_secs: session.elapsed().as_secs(),
                };
            };
            self.writer.begin_break();
            self.phase_entered(Phase::OnBreak, cycle);
            self.notify(Notice::BreakStarted {
                cycle,
                break_kind: kind,
                break_secs: duration.as_secs(),
            })
            .await;
            if !self.sleep(duration).await {
                return self.cancelled();
            }
        }
    }

    async fn finish(&self, outcome: &SessionOutcome) {
        let session = self.session();
        match outcome {
            SessionOutcome::Completed {
                cycles,
                average_score,
                elapsed_secs,
            } => {
                self.notify(Notice::SessionCompleted {
                    cycles: *cycles,
                    average_score: *average_score,
                    elapsed_secs: *elapsed_secs,
                })
                .await;
            }
            // Leaving mid-cycle ends the session without a message.
            SessionOutcome::Cancelled {
                reason: CancelReason::PresenceLost,
                ..
            } => {}
            SessionOutcome::Cancelled {
                reason,
                completed_cycles,
            } => {
                self.notify(Notice::SessionCancelled {
                    reason: reason.to_string(),
                    completed_cycles: *completed_cycles,
                })
                .await;
            }
        }

        self.rt.answers.withdraw(session.user_id());
        self.rt.registry.release(session.user_id(), session.id());

        TraceEvent::SessionFinished {
            session_id: session.id().to_string(),
            outcome: outcome.label(),
            cycles_scored: session.quiz_scores().len(),
            elapsed_secs: session.elapsed().as_secs(),
        }
        .emit();
        tracing::info!(
            session_id = %session.id(),
            user_id = %session.user_id(),
            outcome = %outcome.label(),
            "study session finished"
        );
    }

    fn cancelled(&self) -> SessionOutcome {
        self.writer.cancel();
        let session = self.session();
        SessionOutcome::Cancelled {
            reason: session
                .cancel_token()
                .reason()
                .unwrap_or(CancelReason::Stopped),
            completed_cycles: session.quiz_scores().len() as u32,
        }
    }

    /// Sleep for `duration`; `false` if the session was cancelled first.
    async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.session().cancel_token().cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }

    async fn user_present(&self) -> bool {
        let session = self.session();
        let cfg = self.rt.communities.load(session.community_id()).await;
        self.rt
            .presence
            .is_present(session.user_id(), session.community_id(), &cfg)
    }

    async fn notify(&self, notice: Notice) {
        if let Err(e) = self.rt.transport.notify(&self.target, &notice).await {
            tracing::warn!(
                session_id = %self.session().id(),
                error = %e,
                "failed to deliver notice"
            );
        }
    }

    fn phase_entered(&self, phase: Phase, cycle: u32) {
        let session = self.session();
        tracing::debug!(session_id = %session.id(), phase = phase.as_str(), cycle, "phase entered");
        TraceEvent::PhaseEntered {
            session_id: session.id().to_string(),
            phase: phase.as_str().into(),
            cycle,
        }
        .emit();
    }
}
