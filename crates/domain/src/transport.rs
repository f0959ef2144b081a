//! Contract with the chat platform connector.
//!
//! The connector owns the actual platform connection. We ask it to move
//! users and deliver notices, and it feeds us presence changes over an
//! mpsc channel (see [`PresenceEvent`]).

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ids::{ChannelId, CommunityId, UserId};
use crate::notice::Notice;

/// A presence location (voice channel, room, ...) inside a community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl Location {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// The space a user has to stay in while studying.
///
/// When `id` is set the match is by id, otherwise by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredSpace {
    pub id: Option<String>,
    pub name: String,
}

impl MonitoredSpace {
    pub fn contains(&self, location: &Location) -> bool {
        match &self.id {
            Some(id) => location.id == *id,
            None => location.name == self.name,
        }
    }
}

/// A user changed location. `current == None` means they left entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEvent {
    pub user_id: UserId,
    pub community_id: CommunityId,
    #[serde(default)]
    pub previous: Option<Location>,
    #[serde(default)]
    pub current: Option<Location>,
}

/// Where a notice should be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeTarget {
    pub community_id: CommunityId,
    pub channel_id: ChannelId,
    pub user_id: UserId,
}

/// Outbound half of the connector.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Move a connected user into `space`. Returns where the user ended up.
    ///
    /// Best-effort: callers report failures to the user and carry on.
    async fn move_user_to(
        &self,
        user: &UserId,
        community: &CommunityId,
        space: &MonitoredSpace,
    ) -> Result<Location>;

    /// Deliver a notice. Fire-and-forget from the caller's point of view.
    async fn notify(&self, target: &NoticeTarget, notice: &Notice) -> Result<()>;
}
