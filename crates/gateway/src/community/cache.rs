//! Read-through, write-through cache of community settings.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;

use sb_domain::config::{CommunityConfig, CommunityDefaults};
use sb_domain::error::Result;
use sb_domain::CommunityId;

use super::store::CommunityStore;

pub struct ConfigCache {
    store: Arc<dyn CommunityStore>,
    defaults: CommunityDefaults,
    entries: RwLock<HashMap<CommunityId, CommunityConfig>>,
}

impl ConfigCache {
    pub fn new(store: Arc<dyn CommunityStore>, defaults: CommunityDefaults) -> Self {
        Self {
            store,
            defaults,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Settings for a community. Never fails: a community seen for the first
    /// time gets the defaults (persisted), and a store failure yields the
    /// defaults without caching them so the next call retries.
    pub async fn load(&self, id: &CommunityId) -> CommunityConfig {
        let cached = self.entries.read().get(id).cloned();
        if let Some(cfg) = cached {
            return cfg;
        }

        let cfg = match self.store.fetch(id).await {
            Ok(Some(cfg)) => cfg,
            Ok(None) => {
                let cfg = CommunityConfig::from_defaults(&self.defaults);
                if let Err(e) = self.store.upsert(id, &cfg).await {
                    tracing::warn!(community_id = %id, error = %e, "failed to persist default community config");
                    return cfg;
                }
                tracing::debug!(community_id = %id, "community initialised with defaults");
                cfg
            }
            Err(e) => {
                tracing::warn!(community_id = %id, error = %e, "community store unavailable, using defaults");
                return CommunityConfig::from_defaults(&self.defaults);
            }
        };

        self.entries.write().insert(id.clone(), cfg.clone());
        cfg
    }

    /// Persist new settings, then cache them.
    pub async fn save(&self, id: &CommunityId, mut cfg: CommunityConfig) -> Result<CommunityConfig> {
        cfg.updated_at = Some(Utc::now());
        self.store.upsert(id, &cfg).await?;
        self.entries.write().insert(id.clone(), cfg.clone());
        tracing::info!(community_id = %id, channel = %cfg.study_channel_name, "community config saved");
        Ok(cfg)
    }

    /// Point the community at a different monitored space. Fields left as
    /// `None` keep their current value.
    pub async fn set_monitored_space(
        &self,
        id: &CommunityId,
        channel_id: Option<String>,
        channel_name: Option<String>,
    ) -> Result<CommunityConfig> {
        let mut cfg = self.load(id).await;
        if let Some(channel_id) = channel_id {
            cfg.study_channel_id = Some(channel_id).filter(|s| !s.is_empty());
        }
        if let Some(name) = channel_name {
            cfg.study_channel_name = name;
        }
        self.save(id, cfg).await
    }

    pub fn defaults(&self) -> &CommunityDefaults {
        &self.defaults
    }
}
