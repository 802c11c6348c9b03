//! Query expansion
//!
//! Alternate phrasings of the question widen recall: each chunk is later
//! scored against every phrasing and keeps its best similarity. Expansion
//! is strictly best-effort and never fails a request.

use std::time::Duration;

use crate::config::ProviderConfig;
use crate::providers::{CompletionProvider, CompletionRequest};
use crate::types::ChatMessage;

const EXPANSION_SYSTEM_PROMPT: &str = "Generate concise alternative phrasings of the user's question for retrieval. Return each variant on a new line. No numbering.";

const EXPANSION_MAX_TOKENS: u32 = 256;
const EXPANSION_TEMPERATURE: f32 = 0.1;

/// Ask the completion provider for up to `max_variants` alternate
/// phrasings. The original question always leads the result; phrasings are
/// de-duplicated among themselves but a phrasing repeating the question is
/// kept. On any failure the question alone is returned.
pub async fn expand_query(
    completions: &dyn CompletionProvider,
    config: &ProviderConfig,
    question: &str,
    max_variants: usize,
) -> Vec<String> {
    let request = CompletionRequest {
        model: config.expansion_model.clone(),
        messages: vec![
            ChatMessage::system(EXPANSION_SYSTEM_PROMPT),
            ChatMessage::user(question),
        ],
        reasoning_effort: None,
        max_completion_tokens: Some(EXPANSION_MAX_TOKENS),
        temperature: Some(EXPANSION_TEMPERATURE),
        timeout: Duration::from_secs(config.expansion_timeout_secs),
    };

    let mut variants = vec![question.to_string()];
    match completions.complete(request).await {
        Ok(completion) => {
            let text = completion
                .pointer("/choices/0/message/content")
                .and_then(|content| content.as_str())
                .unwrap_or_default();
            let mut phrasings: Vec<String> = Vec::new();
            for line in text.split('\n') {
                let line = line.trim();
                if line.is_empty() || phrasings.iter().any(|p| p == line) {
                    continue;
                }
                phrasings.push(line.to_string());
                if phrasings.len() == max_variants {
                    break;
                }
            }
            tracing::debug!(count = phrasings.len(), "expanded query");
            variants.extend(phrasings);
        }
        Err(e) => {
            tracing::warn!("query expansion failed, searching with the question alone: {}", e);
        }
    }

    variants
}
