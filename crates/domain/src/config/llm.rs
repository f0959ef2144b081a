use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LLM provider
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The generative model used for content analysis and quiz generation.
///
/// When no API key resolves at startup the content pipeline runs without a
/// provider and every call takes its fallback path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "d_kind")]
    pub kind: ProviderKind,
    #[serde(default = "d_provider_id")]
    pub id: String,
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default = "d_model")]
    pub model: String,
    /// Env var containing the API key.
    #[serde(default = "d_api_key_env")]
    pub api_key_env: String,
    /// Direct key (for local experiments; prefer `api_key_env`).
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "d_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            kind: d_kind(),
            id: d_provider_id(),
            base_url: d_base_url(),
            model: d_model(),
            api_key_env: d_api_key_env(),
            api_key: None,
            timeout_ms: d_timeout_ms(),
            temperature: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Google,
    /// No remote model; every AI call uses its fallback value.
    Disabled,
}

// ── serde default helpers ───────────────────────────────────────────

fn d_kind() -> ProviderKind {
    ProviderKind::Google
}
fn d_provider_id() -> String {
    "gemini".into()
}
fn d_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn d_model() -> String {
    "gemini-2.0-flash".into()
}
fn d_api_key_env() -> String {
    "GEMINI_API_KEY".into()
}
fn d_timeout_ms() -> u64 {
    30_000
}
