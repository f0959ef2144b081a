//! Community settings persistence.
//!
//! The JSON backend keeps every community in `communities.json` under the
//! configured state path and rewrites the file on each upsert. File I/O
//! after startup runs on the blocking pool.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tokio::sync::Mutex;

use sb_domain::config::CommunityConfig;
use sb_domain::error::{Error, Result};
use sb_domain::CommunityId;

#[async_trait::async_trait]
pub trait CommunityStore: Send + Sync {
    async fn fetch(&self, id: &CommunityId) -> Result<Option<CommunityConfig>>;
    async fn upsert(&self, id: &CommunityId, cfg: &CommunityConfig) -> Result<()>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// JSON file backend
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct JsonCommunityStore {
    path: PathBuf,
    entries: RwLock<HashMap<CommunityId, CommunityConfig>>,
    /// Serializes file writes so an older snapshot never lands last.
    write_lock: Mutex<()>,
}

impl JsonCommunityStore {
    /// Load or create the store at `state_path/communities.json`.
    pub fn open(state_path: &Path) -> Result<Self> {
        std::fs::create_dir_all(state_path).map_err(Error::Io)?;
        let path = state_path.join("communities.json");

        let entries: HashMap<CommunityId, CommunityConfig> = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(Error::Io)?;
            serde_json::from_str(&raw)
                .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?
        } else {
            HashMap::new()
        };

        tracing::info!(
            communities = entries.len(),
            path = %path.display(),
            "community store loaded"
        );

        Ok(Self {
            path,
            entries: RwLock::new(entries),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    async fn flush(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let json = {
            let entries = self.entries.read();
            serde_json::to_string_pretty(&*entries)?
        };
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let tmp = path.with_extension("json.tmp");
            std::fs::write(&tmp, json).map_err(Error::Io)?;
            std::fs::rename(&tmp, &path).map_err(Error::Io)?;
            Ok::<(), Error>(())
        })
        .await
        .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))?
    }
}

#[async_trait::async_trait]
impl CommunityStore for JsonCommunityStore {
    async fn fetch(&self, id: &CommunityId) -> Result<Option<CommunityConfig>> {
        Ok(self.entries.read().get(id).cloned())
    }

    async fn upsert(&self, id: &CommunityId, cfg: &CommunityConfig) -> Result<()> {
        let previous = self.entries.write().insert(id.clone(), cfg.clone());
        if let Err(e) = self.flush().await {
            // Keep memory consistent with what is on disk.
            let mut entries = self.entries.write();
            match previous {
                Some(prev) => entries.insert(id.clone(), prev),
                None => entries.remove(id),
            };
            return Err(e);
        }
        Ok(())
    }
}
