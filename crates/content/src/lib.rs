//! Content pipeline: text extraction, key-point summarization and quiz
//! generation.
//!
//! The AI calls never fail outward. Each returns an [`Outcome`] that is
//! either fresh or a deterministic fallback, so a session can always
//! proceed.

pub mod analysis;
pub mod extract;
pub mod outcome;
pub mod quiz;

use std::sync::Arc;

use sb_domain::quiz::Quiz;
use sb_providers::LlmProvider;

pub use extract::{extract_text, extract_text_async, FileKind};
pub use outcome::Outcome;

/// Shared handle to the summarization and quiz-generation collaborators.
#[derive(Clone, Default)]
pub struct ContentPipeline {
    provider: Option<Arc<dyn LlmProvider>>,
}

impl ContentPipeline {
    pub fn new(provider: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { provider }
    }

    /// A pipeline with no provider. Every AI call takes its fallback path.
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Summarize study material into 1 to 7 key points.
    pub async fn summarize(&self, text: &str) -> Outcome<Vec<String>> {
        analysis::summarize(self.provider.as_deref(), text).await
    }

    /// Generate up to three questions from the session's key points.
    pub async fn generate_quiz(&self, key_points: &[String]) -> Outcome<Quiz> {
        quiz::generate_quiz(self.provider.as_deref(), key_points).await
    }
}

impl std::fmt::Debug for ContentPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentPipeline")
            .field(
                "provider",
                &self.provider.as_ref().map(|p| p.provider_id().to_string()),
            )
            .finish()
    }
}
