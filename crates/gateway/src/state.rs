use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use sb_domain::config::Config;
use sb_domain::transport::PresenceEvent;

use crate::runtime::StudyRuntime;

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub runtime: StudyRuntime,

    /// Ingress side of the interrupt bridge.
    pub presence_tx: mpsc::Sender<PresenceEvent>,
    /// Fired once when the server begins shutting down.
    pub shutdown: CancellationToken,

    /// SHA-256 hash of the API bearer token (read once at startup).
    /// `None` = dev mode (no auth enforced).
    pub api_token_hash: Option<Vec<u8>>,
    pub started_at: Instant,
}
