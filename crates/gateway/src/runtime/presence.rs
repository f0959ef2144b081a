//! Last known location of each user, per community.

use std::collections::HashMap;

use parking_lot::RwLock;

use sb_domain::config::CommunityConfig;
use sb_domain::transport::Location;
use sb_domain::{CommunityId, UserId};

/// Fed by presence events and successful moves. `None` as a recorded value
/// means the user was seen leaving every location.
///
/// Only users with a session are recorded; entries for users whose session
/// has ended are dropped by [`prune`](Self::prune).
#[derive(Default)]
pub struct PresenceTracker {
    locations: RwLock<HashMap<(CommunityId, UserId), Option<Location>>>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, user_id: &UserId, community_id: &CommunityId, location: Option<Location>) {
        self.locations
            .write()
            .insert((community_id.clone(), user_id.clone()), location);
    }

    /// `None` when nothing is known about the user in this community.
    pub fn location(&self, user_id: &UserId, community_id: &CommunityId) -> Option<Option<Location>> {
        self.locations
            .read()
            .get(&(community_id.clone(), user_id.clone()))
            .cloned()
    }

    /// Drop every entry whose user fails `keep`. Returns how many were removed.
    pub fn prune(&self, keep: impl Fn(&UserId) -> bool) -> usize {
        let mut locations = self.locations.write();
        let before = locations.len();
        locations.retain(|(_, user_id), _| keep(user_id));
        before - locations.len()
    }

    /// Number of (community, user) entries held.
    pub fn len(&self) -> usize {
        self.locations.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the user should be treated as being in the community's
    /// monitored space. Unknown users count as present.
    pub fn is_present(&self, user_id: &UserId, community_id: &CommunityId, cfg: &CommunityConfig) -> bool {
        match self.location(user_id, community_id) {
            None => true,
            Some(None) => false,
            Some(Some(location)) => cfg.is_monitored(&location),
        }
    }
}
