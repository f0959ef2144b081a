//! Key-point summarization of study material.

use sb_providers::{GenerateRequest, LlmProvider};

use crate::outcome::Outcome;

/// Upper bound on key points kept from a response.
pub const MAX_KEY_POINTS: usize = 7;

/// Source text beyond this many characters is dropped before prompting.
const MAX_SOURCE_CHARS: usize = 60_000;

const SYSTEM: &str = "You are a study assistant. You condense study material into \
                      short, factual key points a student can review quickly.";

/// Placeholder key point used when summarization is unavailable.
pub fn fallback_key_points() -> Vec<String> {
    vec!["Unable to analyze the content. Try again with a different format.".to_string()]
}

pub(crate) fn build_request(text: &str) -> GenerateRequest {
    let source: String = text.chars().take(MAX_SOURCE_CHARS).collect();
    GenerateRequest {
        system: Some(SYSTEM.to_string()),
        prompt: format!(
            "Summarize the following study material into 5 to 7 key points.\n\
             Write one point per line, each line starting with \"- \".\n\
             Do not add any other text.\n\n\
             Material:\n{source}"
        ),
        temperature: Some(0.3),
        max_tokens: Some(1024),
        json_mode: false,
    }
}

/// Pull bullet lines out of a model response.
pub(crate) fn parse_key_points(response: &str) -> Vec<String> {
    response
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            let rest = line
                .strip_prefix('-')
                .or_else(|| line.strip_prefix('*'))
                .or_else(|| line.strip_prefix('•'))?;
            let point = rest.trim_start_matches(['-', ' ']).trim();
            (!point.is_empty()).then(|| point.to_string())
        })
        .take(MAX_KEY_POINTS)
        .collect()
}

pub(crate) async fn summarize(
    provider: Option<&dyn LlmProvider>,
    text: &str,
) -> Outcome<Vec<String>> {
    let Some(provider) = provider else {
        return Outcome::fallback("summarize", fallback_key_points(), "no LLM provider configured");
    };

    match provider.generate(&build_request(text)).await {
        Ok(resp) => {
            let points = parse_key_points(&resp.text);
            if points.is_empty() {
                Outcome::fallback("summarize", fallback_key_points(), "response had no key points")
            } else {
                tracing::debug!(points = points.len(), "content summarized");
                Outcome::Fresh(points)
            }
        }
        Err(e) => Outcome::fallback("summarize", fallback_key_points(), e.to_string()),
    }
}
