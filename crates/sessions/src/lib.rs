//! Study session state for StudyBuddy.
//!
//! Owns the session model, its latched cancellation signal, and the
//! registry that enforces one live session per user.

pub mod cancel;
pub mod registry;
pub mod session;

pub use cancel::{CancelReason, CancelToken};
pub use registry::{AlreadyActive, Reservation, SessionRegistry};
pub use session::{
    NewSession, Phase, ProgressWriter, SessionSnapshot, StudySession, DEFAULT_TOPIC,
};
