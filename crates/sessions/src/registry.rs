//! Session registry: at most one live study session per user.
//!
//! Starting a session is a two-step affair. `try_reserve` atomically claims
//! the user's slot before any slow work (content analysis, moves) happens;
//! the returned [`Reservation`] is then either activated with the built
//! session or dropped, which frees the slot again. A cancel requested while
//! the slot is still reserved is held and applied on activation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use sb_domain::UserId;

use crate::cancel::CancelReason;
use crate::session::{ProgressWriter, StudySession};

/// Returned when the user already has a session (live or being started).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("user {0} already has an active study session")]
pub struct AlreadyActive(pub UserId);

enum Slot {
    Reserved {
        ticket: u64,
        pending_cancel: Option<CancelReason>,
    },
    Active(Arc<StudySession>),
}

#[derive(Default)]
pub struct SessionRegistry {
    slots: Mutex<HashMap<UserId, Slot>>,
    next_ticket: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the user's slot. Fails if a session is active or another start
    /// for the same user is in progress.
    pub fn try_reserve(self: &Arc<Self>, user_id: &UserId) -> Result<Reservation, AlreadyActive> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let mut slots = self.slots.lock();
        if slots.contains_key(user_id) {
            return Err(AlreadyActive(user_id.clone()));
        }
        slots.insert(
            user_id.clone(),
            Slot::Reserved {
                ticket,
                pending_cancel: None,
            },
        );
        Ok(Reservation {
            registry: Arc::clone(self),
            user_id: user_id.clone(),
            ticket,
            activated: false,
        })
    }

    /// The live session for a user, if any.
    pub fn get(&self, user_id: &UserId) -> Option<Arc<StudySession>> {
        match self.slots.lock().get(user_id) {
            Some(Slot::Active(session)) => Some(Arc::clone(session)),
            _ => None,
        }
    }

    /// True while the user has a session or a pending start.
    pub fn contains(&self, user_id: &UserId) -> bool {
        self.slots.lock().contains_key(user_id)
    }

    /// Remove the user's entry if it still belongs to `session_id`.
    /// Returns whether an entry was removed.
    pub fn release(&self, user_id: &UserId, session_id: &str) -> bool {
        let mut slots = self.slots.lock();
        let owned = matches!(slots.get(user_id), Some(Slot::Active(s)) if s.id() == session_id);
        if owned {
            slots.remove(user_id);
            tracing::debug!(user_id = %user_id, session_id, "session released");
        }
        owned
    }

    /// Ask the user's session to stop. A start still in progress is marked
    /// so that its session is cancelled as soon as it activates. Returns
    /// whether a live or pending session existed; repeated calls are
    /// harmless and the first reason wins.
    pub fn request_cancel(&self, user_id: &UserId, reason: CancelReason) -> bool {
        let session = {
            let mut slots = self.slots.lock();
            match slots.get_mut(user_id) {
                Some(Slot::Active(session)) => Arc::clone(session),
                Some(Slot::Reserved { pending_cancel, .. }) => {
                    if pending_cancel.is_none() {
                        *pending_cancel = Some(reason);
                        tracing::info!(user_id = %user_id, reason = %reason, "cancel held for pending start");
                    }
                    return true;
                }
                None => return false,
            }
        };
        if session.cancel_token().cancel(reason) {
            tracing::info!(user_id = %user_id, reason = %reason, "session cancel requested");
        }
        true
    }

    /// Cancel every live session. Returns how many were signalled.
    pub fn cancel_all(&self, reason: CancelReason) -> usize {
        self.list()
            .iter()
            .filter(|s| s.cancel_token().cancel(reason))
            .count()
    }

    pub fn list(&self) -> Vec<Arc<StudySession>> {
        self.slots
            .lock()
            .values()
            .filter_map(|slot| match slot {
                Slot::Active(session) => Some(Arc::clone(session)),
                Slot::Reserved { .. } => None,
            })
            .collect()
    }

    /// Number of live sessions (pending starts excluded).
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| matches!(slot, Slot::Active(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Reservation guard
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A claimed user slot. Dropping it without calling [`activate`] frees
/// the slot.
///
/// [`activate`]: Reservation::activate
pub struct Reservation {
    registry: Arc<SessionRegistry>,
    user_id: UserId,
    ticket: u64,
    activated: bool,
}

impl Reservation {
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Install the session in the reserved slot and hand back the only
    /// writer for its progress. A cancel requested while the slot was
    /// reserved is applied to the session's token here.
    pub fn activate(mut self, session: StudySession) -> (Arc<StudySession>, ProgressWriter) {
        debug_assert_eq!(session.user_id(), &self.user_id);
        let session = Arc::new(session);
        {
            let mut slots = self.registry.slots.lock();
            let pending = match slots.get(&self.user_id) {
                Some(Slot::Reserved {
                    ticket,
                    pending_cancel,
                }) if *ticket == self.ticket => *pending_cancel,
                _ => None,
            };
            if let Some(reason) = pending {
                session.cancel_token().cancel(reason);
                tracing::info!(
                    user_id = %self.user_id,
                    session_id = %session.id(),
                    reason = %reason,
                    "session cancelled before it started"
                );
            }
            slots.insert(self.user_id.clone(), Slot::Active(Arc::clone(&session)));
        }
        self.activated = true;
        let writer = ProgressWriter::new(Arc::clone(&session));
        (session, writer)
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if self.activated {
            return;
        }
        let mut slots = self.registry.slots.lock();
        if matches!(slots.get(&self.user_id), Some(Slot::Reserved { ticket, .. }) if *ticket == self.ticket) {
            slots.remove(&self.user_id);
        }
    }
}

impl std::fmt::Debug for Reservation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reservation")
            .field("user_id", &self.user_id)
            .field("activated", &self.activated)
            .finish()
    }
}
