//! Outbound connector implementations of [`sb_domain::transport::Transport`].

pub mod console;
pub mod logging;
pub mod webhook;

use std::sync::Arc;

use sb_domain::config::TransportConfig;
use sb_domain::error::Result;
use sb_domain::transport::Transport;

pub use console::ConsoleTransport;
pub use logging::LogTransport;
pub use webhook::WebhookTransport;

/// The webhook transport when a URL is configured, otherwise log-only.
pub fn from_config(cfg: &TransportConfig) -> Result<Arc<dyn Transport>> {
    match &cfg.webhook_url {
        Some(url) => {
            tracing::info!(url = %url, "connector webhook transport enabled");
            Ok(Arc::new(WebhookTransport::new(url, cfg.timeout_ms)?))
        }
        None => {
            tracing::warn!("no connector webhook configured, notices will only be logged");
            Ok(Arc::new(LogTransport))
        }
    }
}
