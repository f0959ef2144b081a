//! Session lifecycle scenarios on a paused clock.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tempfile::TempDir;

use sb_content::ContentPipeline;
use sb_domain::config::{BreakKind, CommunityDefaults, PomodoroConfig, TimingOverrides};
use sb_domain::error::{Error, Result};
use sb_domain::notice::Notice;
use sb_domain::quiz::AnswerChoice;
use sb_domain::transport::{Location, MonitoredSpace, NoticeTarget, PresenceEvent, Transport};
use sb_domain::{CommunityId, UserId};
use sb_gateway::community::{ConfigCache, JsonCommunityStore};
use sb_gateway::runtime::{
    start_session, stop_session, AnswerBroker, Answers, InterruptBridge, SessionOutcome,
    StartError, StartRequest, StudyRuntime,
};
use sb_sessions::{CancelReason, Phase};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Fakes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Default)]
struct RecordingTransport {
    notices: Mutex<Vec<Notice>>,
    fail_moves: bool,
    /// Every notice is recorded, then reported as undeliverable.
    fail_notices: bool,
    /// When set, every posted quiz is answered immediately.
    auto_answer: Mutex<Option<(Arc<AnswerBroker>, Answers)>>,
}

impl RecordingTransport {
    fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    fn answer_with(&self, broker: Arc<AnswerBroker>, answers: Answers) {
        *self.auto_answer.lock() = Some((broker, answers));
    }
}

#[async_trait::async_trait]
impl Transport for RecordingTransport {
    async fn move_user_to(
        &self,
        _user: &UserId,
        _community: &CommunityId,
        space: &MonitoredSpace,
    ) -> Result<Location> {
        if self.fail_moves {
            return Err(Error::Transport("user is not connected".into()));
        }
        Ok(Location::new("vc-study", space.name.clone()))
    }

    async fn notify(&self, target: &NoticeTarget, notice: &Notice) -> Result<()> {
        self.notices.lock().push(notice.clone());
        if let Notice::QuizPosted { .. } = notice {
            if let Some((broker, answers)) = self.auto_answer.lock().as_ref() {
                let _ = broker.submit(&target.user_id, answers.clone());
            }
        }
        if self.fail_notices {
            return Err(Error::Transport("connector returned 502".into()));
        }
        Ok(())
    }
}

struct Harness {
    rt: StudyRuntime,
    transport: Arc<RecordingTransport>,
    _dir: TempDir,
}

fn harness_with(transport: RecordingTransport, pomodoro: PomodoroConfig) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonCommunityStore::open(dir.path()).unwrap());
    let cache = Arc::new(ConfigCache::new(store, CommunityDefaults::default()));
    let transport = Arc::new(transport);
    let rt = StudyRuntime::new(pomodoro, cache, ContentPipeline::offline(), transport.clone());
    Harness {
        rt,
        transport,
        _dir: dir,
    }
}

/// Answers every quiz correctly (the offline quiz's answer is A).
fn answering_harness() -> Harness {
    let h = harness_with(RecordingTransport::default(), PomodoroConfig::default());
    h.transport
        .answer_with(h.rt.answers.clone(), vec![Some(AnswerChoice::A)]);
    h
}

fn request(user: &str, cycles: u32) -> StartRequest {
    StartRequest {
        user_id: user.into(),
        community_id: "guild-1".into(),
        channel_id: "text-1".into(),
        cycles,
        topic: Some("Cell biology".into()),
        text: Some("Cells are the basic unit of life.".into()),
        attachment: None,
        timings: TimingOverrides::default(),
    }
}

fn breaks(notices: &[Notice]) -> Vec<BreakKind> {
    notices
        .iter()
        .filter_map(|n| match n {
            Notice::BreakStarted { break_kind, .. } => Some(*break_kind),
            _ => None,
        })
        .collect()
}

fn count(notices: &[Notice], pred: impl Fn(&Notice) -> bool) -> usize {
    notices.iter().filter(|n| pred(n)).count()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Full runs
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test(start_paused = true)]
async fn four_cycles_run_to_completion_with_three_short_breaks() {
    let h = answering_harness();
    let started = start_session(&h.rt, request("u1", 4)).await.unwrap();
    let session = started.session.clone();
    assert!(started.degraded, "offline pipeline falls back");

    let outcome = started.handle.await.unwrap();

    match outcome {
        SessionOutcome::Completed {
            cycles,
            average_score,
            elapsed_secs,
        } => {
            assert_eq!(cycles, 4);
            assert!((average_score - 1.0).abs() < 1e-9);
            assert_eq!(elapsed_secs, 4 * 1500 + 3 * 300);
        }
        other => panic!("expected completion, got {other:?}"),
    }
    assert_eq!(session.phase(), Phase::Completed);
    assert_eq!(session.quiz_scores().len(), 4);
    assert!(h.rt.registry.get(&"u1".into()).is_none());

    let notices = h.transport.notices();
    assert!(matches!(notices[0], Notice::SessionStarted { cycles: 4, .. }));
    assert_eq!(count(&notices, |n| matches!(n, Notice::WorkStarted { .. })), 4);
    assert_eq!(count(&notices, |n| matches!(n, Notice::QuizScored { .. })), 4);
    assert_eq!(breaks(&notices), vec![BreakKind::Short; 3]);
    assert!(matches!(
        notices.last(),
        Some(Notice::SessionCompleted { cycles: 4, .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn long_break_follows_every_fourth_cycle_except_the_last() {
    let h = answering_harness();
    let mut req = request("u1", 6);
    req.timings = TimingOverrides {
        work_secs: Some(60),
        short_break_secs: Some(10),
        long_break_secs: Some(30),
    };
    let started = start_session(&h.rt, req).await.unwrap();
    let outcome = started.handle.await.unwrap();

    assert!(matches!(outcome, SessionOutcome::Completed { cycles: 6, .. }));
    use BreakKind::*;
    assert_eq!(
        breaks(&h.transport.notices()),
        vec![Short, Short, Short, Long, Short]
    );
}

#[tokio::test(start_paused = true)]
async fn single_cycle_has_no_break() {
    let h = answering_harness();
    let started = start_session(&h.rt, request("u1", 1)).await.unwrap();
    assert!(matches!(
        started.handle.await.unwrap(),
        SessionOutcome::Completed { cycles: 1, .. }
    ));
    assert!(breaks(&h.transport.notices()).is_empty());
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Quiz
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test(start_paused = true)]
async fn unanswered_quiz_times_out_as_zero() {
    let h = harness_with(RecordingTransport::default(), PomodoroConfig::default());
    let started = start_session(&h.rt, request("u1", 1)).await.unwrap();
    let session = started.session.clone();

    let outcome = started.handle.await.unwrap();

    assert!(matches!(outcome, SessionOutcome::Completed { average_score, .. } if average_score == 0.0));
    let scores = session.quiz_scores();
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].correct, 0);
    assert_eq!(session.elapsed().as_secs(), 1500 + 180);
    assert_eq!(
        count(&h.transport.notices(), |n| matches!(n, Notice::QuizTimedOut { cycle: 1 })),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn wrong_answers_score_partially() {
    let h = harness_with(RecordingTransport::default(), PomodoroConfig::default());
    h.transport
        .answer_with(h.rt.answers.clone(), vec![Some(AnswerChoice::C)]);
    let started = start_session(&h.rt, request("u1", 1)).await.unwrap();
    let session = started.session.clone();
    started.handle.await.unwrap();

    assert_eq!(session.quiz_scores()[0].correct, 0);
    assert_eq!(session.quiz_scores()[0].total, 1);
    assert!(h
        .transport
        .notices()
        .contains(&Notice::QuizScored {
            cycle: 1,
            correct: 0,
            total: 1
        }));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Cancellation and interrupts
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test(start_paused = true)]
async fn stop_during_work_sleep_ends_promptly_without_scoring() {
    let h = answering_harness();
    let started = start_session(&h.rt, request("u1", 4)).await.unwrap();
    let session = started.session.clone();

    // Cycle 1 ends at 1500s, its break at 1800s; cycle 2 is working at 2000s.
    tokio::time::sleep(Duration::from_secs(2000)).await;
    assert_eq!(session.current_cycle(), 2);
    assert_eq!(session.phase(), Phase::Working);

    assert!(stop_session(&h.rt, &"u1".into()));
    assert!(stop_session(&h.rt, &"u1".into()), "stop is idempotent");
    let outcome = started.handle.await.unwrap();

    assert_eq!(
        outcome,
        SessionOutcome::Cancelled {
            reason: CancelReason::Stopped,
            completed_cycles: 1,
        }
    );
    assert!(session.elapsed() < Duration::from_secs(2001));
    assert_eq!(session.phase(), Phase::Cancelled);
    assert_eq!(session.quiz_scores().len(), 1);
    assert!(h.rt.registry.get(&"u1".into()).is_none());
    assert!(!stop_session(&h.rt, &"u1".into()));
    assert!(matches!(
        h.transport.notices().last(),
        Some(Notice::SessionCancelled {
            completed_cycles: 1,
            ..
        })
    ));
}

#[tokio::test(start_paused = true)]
async fn stop_during_quiz_wait_discards_the_quiz() {
    let h = harness_with(RecordingTransport::default(), PomodoroConfig::default());
    let started = start_session(&h.rt, request("u1", 2)).await.unwrap();
    let session = started.session.clone();

    tokio::time::sleep(Duration::from_secs(1500 + 60)).await;
    assert_eq!(session.phase(), Phase::Quizzing);
    assert!(h.rt.answers.is_waiting(&"u1".into()));

    stop_session(&h.rt, &"u1".into());
    let outcome = started.handle.await.unwrap();

    assert!(matches!(outcome, SessionOutcome::Cancelled { completed_cycles: 0, .. }));
    assert!(session.quiz_scores().is_empty());
    assert!(!h.rt.answers.is_waiting(&"u1".into()));
}

#[tokio::test(start_paused = true)]
async fn stop_during_break_keeps_the_scored_cycle() {
    let h = answering_harness();
    let started = start_session(&h.rt, request("u1", 4)).await.unwrap();
    let session = started.session.clone();

    // Cycle 1 is scored at 1500s; its short break runs until 1800s.
    tokio::time::sleep(Duration::from_secs(1600)).await;
    assert_eq!(session.phase(), Phase::OnBreak);
    assert_eq!(session.current_cycle(), 1);
    assert_eq!(session.quiz_scores().len(), 1);

    assert!(stop_session(&h.rt, &"u1".into()));
    let outcome = started.handle.await.unwrap();

    assert_eq!(
        outcome,
        SessionOutcome::Cancelled {
            reason: CancelReason::Stopped,
            completed_cycles: 1,
        }
    );
    assert!(session.elapsed() < Duration::from_secs(1601));
    assert_eq!(session.phase(), Phase::Cancelled);
    assert_eq!(session.quiz_scores().len(), 1);
    assert!(h.rt.registry.is_empty());

    let notices = h.transport.notices();
    assert_eq!(count(&notices, |n| matches!(n, Notice::WorkStarted { .. })), 1);
    assert_eq!(breaks(&notices), vec![BreakKind::Short]);
    assert!(matches!(
        notices.last(),
        Some(Notice::SessionCancelled {
            completed_cycles: 1,
            ..
        })
    ));
}

#[tokio::test(start_paused = true)]
async fn stop_while_the_start_is_pending_cancels_on_activation() {
    let h = answering_harness();

    // The start first yields while persisting the new community's
    // defaults, after its reservation is taken.
    let rt = h.rt.clone();
    let stopper = tokio::spawn(async move {
        let user = UserId::from("u1");
        loop {
            if rt.registry.contains(&user) {
                let pending = rt.registry.get(&user).is_none();
                return (stop_session(&rt, &user), pending);
            }
            tokio::task::yield_now().await;
        }
    });
    let started = start_session(&h.rt, request("u1", 2)).await.unwrap();
    assert_eq!(stopper.await.unwrap(), (true, true));

    let outcome = started.handle.await.unwrap();
    assert_eq!(
        outcome,
        SessionOutcome::Cancelled {
            reason: CancelReason::Stopped,
            completed_cycles: 0,
        }
    );
    assert!(started.session.elapsed() < Duration::from_secs(1));
    let notices = h.transport.notices();
    assert_eq!(count(&notices, |n| matches!(n, Notice::WorkStarted { .. })), 0);
    assert!(h.rt.registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn presence_events_without_a_session_are_not_retained() {
    let h = answering_harness();
    let bridge = InterruptBridge::new(h.rt.clone());

    for i in 0..10_000 {
        let raised = bridge
            .handle(PresenceEvent {
                user_id: format!("user-{i}").into(),
                community_id: "guild-1".into(),
                previous: None,
                current: Some(Location::new("vc-lounge", "lounge")),
            })
            .await;
        assert!(!raised);
    }
    assert!(h.rt.registry.is_empty());
    assert!(h.rt.presence.is_empty());

    // A finished session's entry goes on the next prune.
    let started = start_session(&h.rt, request("u1", 1)).await.unwrap();
    assert_eq!(h.rt.presence.len(), 1);
    started.handle.await.unwrap();
    let registry = h.rt.registry.clone();
    assert_eq!(h.rt.presence.prune(|user| registry.contains(user)), 1);
    assert!(h.rt.presence.is_empty());
}

#[tokio::test(start_paused = true)]
async fn leaving_the_study_space_during_cycle_two_cancels_before_its_quiz() {
    let h = answering_harness();
    let bridge = InterruptBridge::new(h.rt.clone());
    let started = start_session(&h.rt, request("u1", 4)).await.unwrap();
    let session = started.session.clone();

    tokio::time::sleep(Duration::from_secs(2000)).await;
    assert_eq!(session.current_cycle(), 2);

    let raised = bridge
        .handle(PresenceEvent {
            user_id: "u1".into(),
            community_id: "guild-1".into(),
            previous: Some(Location::new("vc-study", "study-vc")),
            current: Some(Location::new("vc-lounge", "lounge")),
        })
        .await;
    assert!(raised);

    let outcome = started.handle.await.unwrap();
    assert_eq!(
        outcome,
        SessionOutcome::Cancelled {
            reason: CancelReason::LeftMonitoredSpace,
            completed_cycles: 1,
        }
    );
    assert!(h.rt.registry.get(&"u1".into()).is_none());
    let quizzes = count(&h.transport.notices(), |n| matches!(n, Notice::QuizPosted { .. }));
    assert_eq!(quizzes, 1, "no quiz may run for the interrupted cycle");
}

#[tokio::test(start_paused = true)]
async fn moves_inside_the_study_space_do_not_interrupt() {
    let h = answering_harness();
    let bridge = InterruptBridge::new(h.rt.clone());
    let started = start_session(&h.rt, request("u1", 1)).await.unwrap();

    let raised = bridge
        .handle(PresenceEvent {
            user_id: "u1".into(),
            community_id: "guild-1".into(),
            previous: None,
            current: Some(Location::new("vc-other-id", "study-vc")),
        })
        .await;
    assert!(!raised);

    // Events for other communities or other users are ignored too.
    assert!(
        !bridge
            .handle(PresenceEvent {
                user_id: "u1".into(),
                community_id: "guild-2".into(),
                previous: None,
                current: None,
            })
            .await
    );
    assert!(matches!(
        started.handle.await.unwrap(),
        SessionOutcome::Completed { .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn absence_at_work_end_terminates_silently() {
    let h = answering_harness();
    let started = start_session(&h.rt, request("u1", 3)).await.unwrap();

    // The departure is known to the tracker but no interrupt was raised.
    h.rt.presence
        .record(&"u1".into(), &"guild-1".into(), None);
    let outcome = started.handle.await.unwrap();

    assert_eq!(
        outcome,
        SessionOutcome::Cancelled {
            reason: CancelReason::PresenceLost,
            completed_cycles: 0,
        }
    );
    let notices = h.transport.notices();
    assert_eq!(count(&notices, |n| matches!(n, Notice::QuizPosted { .. })), 0);
    assert_eq!(count(&notices, |n| matches!(n, Notice::SessionCancelled { .. })), 0);
    assert!(h.rt.registry.is_empty());
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Start flow
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test(start_paused = true)]
async fn invalid_requests_are_rejected_without_side_effects() {
    let h = answering_harness();

    for cycles in [0, 9] {
        let err = start_session(&h.rt, request("u1", cycles)).await.unwrap_err();
        assert!(matches!(err, StartError::Validation(_)), "{cycles} cycles");
    }

    let mut empty = request("u1", 2);
    empty.text = Some("   ".into());
    assert!(matches!(
        start_session(&h.rt, empty).await.unwrap_err(),
        StartError::Validation(_)
    ));

    let mut unsupported = request("u1", 2);
    unsupported.attachment = Some(sb_gateway::runtime::Attachment {
        filename: "slides.pptx".into(),
        bytes: vec![1, 2, 3],
    });
    assert!(matches!(
        start_session(&h.rt, unsupported).await.unwrap_err(),
        StartError::Validation(_)
    ));

    assert!(h.transport.notices().is_empty());
    assert_eq!(h.rt.rate_limiter.tracked_users(), 0);
    assert!(start_session(&h.rt, request("u1", 2)).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn attachment_text_takes_precedence_over_inline_text() {
    let h = answering_harness();
    let mut req = request("u1", 1);
    req.text = None;
    req.attachment = Some(sb_gateway::runtime::Attachment {
        filename: "notes.md".into(),
        bytes: b"# Mitosis\nCells divide.".to_vec(),
    });
    assert!(start_session(&h.rt, req).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn second_start_within_cooldown_is_rate_limited() {
    let h = answering_harness();
    start_session(&h.rt, request("u1", 1)).await.unwrap();

    match start_session(&h.rt, request("u1", 1)).await.unwrap_err() {
        StartError::RateLimited { remaining } => {
            assert!(remaining <= Duration::from_secs(300));
            assert!(remaining > Duration::from_secs(290));
        }
        other => panic!("expected rate limit, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn concurrent_starts_for_one_user_admit_one() {
    let pomodoro = PomodoroConfig {
        start_cooldown_secs: 0,
        ..PomodoroConfig::default()
    };
    let h = harness_with(RecordingTransport::default(), pomodoro);

    let (a, b) = tokio::join!(
        start_session(&h.rt, request("u1", 1)),
        start_session(&h.rt, request("u1", 1)),
    );
    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(StartError::AlreadyActive(_)))));
    assert_eq!(h.rt.registry.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_move_is_reported_and_the_session_continues() {
    let transport = RecordingTransport {
        fail_moves: true,
        ..Default::default()
    };
    let h = harness_with(transport, PomodoroConfig::default());
    h.transport
        .answer_with(h.rt.answers.clone(), vec![Some(AnswerChoice::A)]);

    let started = start_session(&h.rt, request("u1", 1)).await.unwrap();
    assert!(matches!(
        h.transport.notices()[0],
        Notice::MoveFailed { ref space, .. } if space == "study-vc"
    ));
    assert!(matches!(
        started.handle.await.unwrap(),
        SessionOutcome::Completed { .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn undeliverable_notices_do_not_stop_the_session() {
    let transport = RecordingTransport {
        fail_notices: true,
        ..Default::default()
    };
    let h = harness_with(transport, PomodoroConfig::default());
    h.transport
        .answer_with(h.rt.answers.clone(), vec![Some(AnswerChoice::A)]);

    let started = start_session(&h.rt, request("u1", 3)).await.unwrap();
    let session = started.session.clone();
    let outcome = started.handle.await.unwrap();

    assert!(matches!(outcome, SessionOutcome::Completed { cycles: 3, .. }));
    assert_eq!(session.phase(), Phase::Completed);
    assert_eq!(session.quiz_scores().len(), 3);
    assert!(h.rt.registry.is_empty());
    assert!(!stop_session(&h.rt, &"u1".into()));

    // Every notice was still attempted, in order.
    let notices = h.transport.notices();
    assert!(matches!(notices[0], Notice::SessionStarted { .. }));
    assert_eq!(count(&notices, |n| matches!(n, Notice::QuizPosted { .. })), 3);
    assert!(matches!(
        notices.last(),
        Some(Notice::SessionCompleted { cycles: 3, .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn zero_request_timings_are_rejected() {
    let h = answering_harness();
    for timings in [
        TimingOverrides {
            work_secs: Some(0),
            ..Default::default()
        },
        TimingOverrides {
            short_break_secs: Some(0),
            ..Default::default()
        },
        TimingOverrides {
            long_break_secs: Some(0),
            ..Default::default()
        },
    ] {
        let mut req = request("u1", 2);
        req.timings = timings;
        let err = start_session(&h.rt, req).await.unwrap_err();
        assert!(matches!(err, StartError::Validation(ref m) if m.contains("timing")), "{timings:?}");
    }
    assert_eq!(h.rt.rate_limiter.tracked_users(), 0);
    assert!(h.rt.registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn community_timings_apply_below_request_overrides() {
    let h = answering_harness();
    let guild = CommunityId::from("guild-1");
    let mut cfg = h.rt.communities.load(&guild).await;
    cfg.timings = TimingOverrides {
        work_secs: Some(600),
        short_break_secs: Some(120),
        long_break_secs: None,
    };
    h.rt.communities.save(&guild, cfg).await.unwrap();

    let mut req = request("u1", 2);
    req.timings.short_break_secs = Some(30);
    let started = start_session(&h.rt, req).await.unwrap();
    let timings = *started.session.timings();

    assert_eq!(timings.work, Duration::from_secs(600));
    assert_eq!(timings.short_break, Duration::from_secs(30));
    assert_eq!(timings.long_break, Duration::from_secs(900));
    started.handle.await.unwrap();
}
