mod community;
mod llm;
mod observability;
mod pomodoro;
mod server;
mod transport;

pub use community::*;
pub use llm::*;
pub use observability::*;
pub use pomodoro::*;
pub use server::*;
pub use transport::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pomodoro: PomodoroConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub community_defaults: CommunityDefaults,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let mut error = |field: &str, message: &str| {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: field.into(),
                message: message.into(),
            })
        };

        if self.server.port == 0 {
            error("server.port", "port must be greater than 0");
        }
        if self.server.host.is_empty() {
            error("server.host", "host must not be empty");
        }

        let p = &self.pomodoro;
        if p.work_secs == 0 {
            error("pomodoro.work_secs", "work phase must last at least one second");
        }
        if p.min_cycles == 0 {
            error("pomodoro.min_cycles", "at least one cycle is required");
        }
        if p.min_cycles > p.max_cycles {
            error("pomodoro.min_cycles", "min_cycles must not exceed max_cycles");
        }
        if p.quiz_answer_timeout_secs == 0 {
            error(
                "pomodoro.quiz_answer_timeout_secs",
                "quiz answer timeout must be greater than 0",
            );
        }
        if self.transport.presence_buffer == 0 {
            error("transport.presence_buffer", "channel capacity must be greater than 0");
        }
        if self.community_defaults.study_channel_name.trim().is_empty() {
            error(
                "community_defaults.study_channel_name",
                "default study channel name must not be empty",
            );
        }
        if self.llm.kind == ProviderKind::Google && self.llm.base_url.is_empty() {
            error("llm.base_url", "provider base_url must not be empty");
        }

        if !(0.0..=1.0).contains(&self.observability.sample_rate) {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "observability.sample_rate".into(),
                message: "outside 0.0..=1.0, will be clamped".into(),
            });
        }
        if self.pomodoro.long_break_every == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "pomodoro.long_break_every".into(),
                message: "0 disables long breaks".into(),
            });
        }
        if self.transport.webhook_url.is_none() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "transport.webhook_url".into(),
                message: "no connector webhook configured; notices will only be logged".into(),
            });
        }
        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "server.cors.allowed_origins".into(),
                message: "wildcard \"*\" allows all origins (not recommended for production)"
                    .into(),
            });
        }

        issues
    }
}
