//! Per-user start cooldown.
//!
//! [`RateLimiter`] remembers when each user last started a session and
//! rejects a new start until the cooldown has fully elapsed. The check and
//! the record happen under one lock, so two racing starts cannot both pass.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use sb_domain::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Denied { remaining: Duration },
}

#[derive(Default)]
pub struct RateLimiter {
    last_start: Mutex<HashMap<UserId, Instant>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check_and_record(&self, user_id: &UserId, cooldown: Duration) -> RateDecision {
        self.check_and_record_at(user_id, cooldown, Instant::now())
    }

    /// Allow and record a start at `now`, or report how long the user
    /// still has to wait. A start exactly `cooldown` after the last one is
    /// allowed.
    pub fn check_and_record_at(
        &self,
        user_id: &UserId,
        cooldown: Duration,
        now: Instant,
    ) -> RateDecision {
        let mut last_start = self.last_start.lock();
        if let Some(last) = last_start.get(user_id) {
            let elapsed = now.saturating_duration_since(*last);
            if elapsed < cooldown {
                return RateDecision::Denied {
                    remaining: cooldown - elapsed,
                };
            }
        }
        last_start.insert(user_id.clone(), now);
        RateDecision::Allowed
    }

    /// Drop entries whose cooldown has long passed. Returns how many were
    /// removed.
    pub fn prune(&self, cooldown: Duration) -> usize {
        let now = Instant::now();
        let mut last_start = self.last_start.lock();
        let before = last_start.len();
        last_start.retain(|_, last| now.saturating_duration_since(*last) < cooldown);
        before - last_start.len()
    }

    pub fn tracked_users(&self) -> usize {
        self.last_start.lock().len()
    }
}
