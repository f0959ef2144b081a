//! Shared types for StudyBuddy: identifiers, configuration, the transport
//! contract, user-facing notices and structured trace events.

pub mod config;
pub mod error;
pub mod ids;
pub mod notice;
pub mod quiz;
pub mod trace;
pub mod transport;

pub use error::{Error, Result};
pub use ids::{ChannelId, CommunityId, UserId};
