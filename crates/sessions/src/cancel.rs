//! Per-session cancellation signal.
//!
//! A `CancelToken` is latched: once cancelled it stays cancelled, and the
//! first reason recorded wins. Waiters can `await` it, so timed phases can
//! be interrupted without waiting out their full duration.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Why a session was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// The user (or connector) asked to stop.
    Stopped,
    /// The user moved out of the monitored space.
    LeftMonitoredSpace,
    /// The user was not present when a work phase ended.
    PresenceLost,
    /// The process is shutting down.
    Shutdown,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stopped => "stopped by user",
            Self::LeftMonitoredSpace => "left the study channel",
            Self::PresenceLost => "no longer present",
            Self::Shutdown => "server shutting down",
        })
    }
}

struct Inner {
    token: CancellationToken,
    reason: Mutex<Option<CancelReason>>,
}

/// A cancellation flag that can be checked or awaited.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                token: CancellationToken::new(),
                reason: Mutex::new(None),
            }),
        }
    }

    /// Signal cancellation. Returns `true` if this call latched the token,
    /// `false` if it was already cancelled.
    pub fn cancel(&self, reason: CancelReason) -> bool {
        {
            let mut slot = self.inner.reason.lock();
            if slot.is_some() {
                return false;
            }
            *slot = Some(reason);
        }
        self.inner.token.cancel();
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// The reason given by the first `cancel` call.
    pub fn reason(&self) -> Option<CancelReason> {
        *self.inner.reason.lock()
    }

    /// Resolves once the token is cancelled (immediately if it already is).
    pub async fn cancelled(&self) {
        self.inner.token.cancelled().await
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("reason", &self.reason())
            .finish()
    }
}
