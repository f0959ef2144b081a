use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Connector transport
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Outbound connector settings.  Without a `webhook_url` notices are only
/// written to the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "d_timeout_ms")]
    pub timeout_ms: u64,
    /// Capacity of the presence-event channel feeding the interrupt bridge.
    #[serde(default = "d_presence_buffer")]
    pub presence_buffer: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_ms: d_timeout_ms(),
            presence_buffer: d_presence_buffer(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Storage
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for persisted state (community settings).
    #[serde(default = "d_state_path")]
    pub state_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: d_state_path(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_timeout_ms() -> u64 {
    10_000
}
fn d_presence_buffer() -> usize {
    1024
}
fn d_state_path() -> PathBuf {
    PathBuf::from("./data")
}
