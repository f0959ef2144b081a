//! Typed success-or-fallback results for collaborator calls.

use sb_domain::trace::TraceEvent;

/// Either a fresh result from the remote collaborator, or the deterministic
/// substitute used because the call failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Fresh(T),
    Fallback { value: T, reason: String },
}

impl<T> Outcome<T> {
    /// Build a fallback and record why it was needed.
    pub(crate) fn fallback(collaborator: &str, value: T, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        tracing::warn!(collaborator, reason = %reason, "collaborator failed, using fallback");
        TraceEvent::CollaboratorFallback {
            collaborator: collaborator.into(),
            reason: reason.clone(),
        }
        .emit();
        Self::Fallback { value, reason }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Fresh(v) | Self::Fallback { value: v, .. } => v,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Fresh(v) | Self::Fallback { value: v, .. } => v,
        }
    }
}
