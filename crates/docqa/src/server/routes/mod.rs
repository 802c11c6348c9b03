//! Request handlers

pub mod chat;
pub mod chat_stream;

use std::time::Duration;

use crate::generation::prompt::PromptBuilder;
use crate::providers::CompletionRequest;
use crate::retrieval::RetrievedContext;
use crate::server::state::AppState;
use crate::types::{ChatMessage, ChatRequest};

/// Assemble the completion call for a question: system framing first,
/// then surviving history turns, then the question itself.
pub(crate) async fn completion_request_for(
    state: &AppState,
    request: &ChatRequest,
    question: &str,
    retrieved: &RetrievedContext,
) -> CompletionRequest {
    let provider = &state.config().provider;
    let model = state.completions().resolve_model().await;

    let mut messages = vec![ChatMessage::system(PromptBuilder::system_for(retrieved))];
    messages.extend(request.sanitized_history());
    messages.push(ChatMessage::user(question));

    let reasoning_effort = if provider.reasoning_effort.is_empty() {
        None
    } else {
        Some(provider.reasoning_effort.clone())
    };

    CompletionRequest {
        model,
        messages,
        reasoning_effort,
        max_completion_tokens: Some(provider.max_completion_tokens),
        temperature: Some(provider.temperature),
        timeout: Duration::from_secs(provider.completion_timeout_secs),
    }
}
