//! Interrupt bridge: turns presence events into session cancellations.
//!
//! Runs as its own task reading the presence channel. Raising an interrupt
//! only latches the session's cancel token; the scheduler notices at its
//! next suspend point, so the bridge never waits on a session.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use sb_domain::trace::TraceEvent;
use sb_domain::transport::PresenceEvent;
use sb_sessions::CancelReason;

use super::StudyRuntime;

pub struct InterruptBridge {
    rt: StudyRuntime,
}

impl InterruptBridge {
    pub fn new(rt: StudyRuntime) -> Self {
        Self { rt }
    }

    /// Consume presence events until the channel closes or `shutdown` fires.
    pub fn spawn(
        self,
        mut events: mpsc::Receiver<PresenceEvent>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::debug!("interrupt bridge started");
            loop {
                let event = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    event = events.recv() => match event {
                        Some(event) => event,
                        None => break,
                    },
                };
                self.handle(event).await;
            }
            tracing::debug!("interrupt bridge stopped");
        })
    }

    /// Record the user's new location and cancel their session if they
    /// left the monitored space. Returns whether an interrupt was raised.
    ///
    /// Events for users with neither a session nor a pending start are
    /// dropped without touching the presence tracker.
    pub async fn handle(&self, event: PresenceEvent) -> bool {
        if !self.rt.registry.contains(&event.user_id) {
            return false;
        }
        self.rt
            .presence
            .record(&event.user_id, &event.community_id, event.current.clone());

        let Some(session) = self.rt.registry.get(&event.user_id) else {
            return false;
        };
        if session.community_id() != &event.community_id || session.phase().is_terminal() {
            return false;
        }

        let cfg = self.rt.communities.load(&event.community_id).await;
        let still_inside = event
            .current
            .as_ref()
            .is_some_and(|location| cfg.is_monitored(location));
        if still_inside {
            return false;
        }

        let raised = session
            .cancel_token()
            .cancel(CancelReason::LeftMonitoredSpace);
        if raised {
            tracing::info!(
                session_id = %session.id(),
                user_id = %event.user_id,
                community_id = %event.community_id,
                to = event.current.as_ref().map(|l| l.name.as_str()).unwrap_or("<disconnected>"),
                "user left the study space, cancelling session"
            );
            TraceEvent::InterruptRaised {
                user_id: event.user_id.to_string(),
                community_id: event.community_id.to_string(),
                reason: CancelReason::LeftMonitoredSpace.to_string(),
            }
            .emit();
        }
        raised
    }
}
