use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pomodoro::TimingOverrides;
use crate::transport::{Location, MonitoredSpace};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Per-community settings
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Values given to a community the first time it is seen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityDefaults {
    #[serde(default = "d_study_channel_name")]
    pub study_channel_name: String,
    #[serde(default = "d_prefix")]
    pub prefix: String,
    #[serde(default = "d_max_session_duration_mins")]
    pub max_session_duration_mins: u32,
}

impl Default for CommunityDefaults {
    fn default() -> Self {
        Self {
            study_channel_name: d_study_channel_name(),
            prefix: d_prefix(),
            max_session_duration_mins: d_max_session_duration_mins(),
        }
    }
}

/// Stored settings for one community.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityConfig {
    /// Explicit monitored location id; takes precedence over the name.
    #[serde(default)]
    pub study_channel_id: Option<String>,
    pub study_channel_name: String,
    pub prefix: String,
    pub max_session_duration_mins: u32,
    #[serde(default)]
    pub timings: TimingOverrides,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CommunityConfig {
    pub fn from_defaults(defaults: &CommunityDefaults) -> Self {
        Self {
            study_channel_id: None,
            study_channel_name: defaults.study_channel_name.clone(),
            prefix: defaults.prefix.clone(),
            max_session_duration_mins: defaults.max_session_duration_mins,
            timings: TimingOverrides::default(),
            updated_at: None,
        }
    }

    pub fn monitored_space(&self) -> MonitoredSpace {
        MonitoredSpace {
            id: self.study_channel_id.clone(),
            name: self.study_channel_name.clone(),
        }
    }

    pub fn is_monitored(&self, location: &Location) -> bool {
        self.monitored_space().contains(location)
    }
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self::from_defaults(&CommunityDefaults::default())
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_study_channel_name() -> String {
    "study-vc".into()
}
fn d_prefix() -> String {
    "!".into()
}
fn d_max_session_duration_mins() -> u32 {
    120
}
