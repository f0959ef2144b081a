pub mod google;
pub mod traits;
pub(crate) mod util;

use std::sync::Arc;

use sb_domain::config::{LlmConfig, ProviderKind};
use sb_domain::error::Result;

pub use google::GoogleProvider;
pub use traits::{GenerateRequest, GenerateResponse, LlmProvider, Usage};

/// Build the configured provider.
///
/// Returns `Ok(None)` when the provider is disabled; a missing API key is an
/// error so the caller can decide whether to degrade or abort.
pub fn create_provider(cfg: &LlmConfig) -> Result<Option<Arc<dyn LlmProvider>>> {
    match cfg.kind {
        ProviderKind::Disabled => Ok(None),
        ProviderKind::Google => {
            let provider = GoogleProvider::from_config(cfg)?;
            Ok(Some(Arc::new(provider)))
        }
    }
}
