//! Upstream provider traits and clients

pub mod openai;
pub mod remedy;

pub use openai::OpenAiClient;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use serde_json::{json, Value};

use crate::error::Result;
use crate::types::ChatMessage;

/// Byte stream of provider SSE frames
pub type EventByteStream = BoxStream<'static, Result<Bytes>>;

/// One chat-completion call in provider wire shape
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model to run against
    pub model: String,
    /// Conversation messages, system framing first
    pub messages: Vec<ChatMessage>,
    /// Reasoning effort hint, omitted from the payload when None
    pub reasoning_effort: Option<String>,
    /// Completion token cap, omitted when None
    pub max_completion_tokens: Option<u32>,
    /// Sampling temperature, omitted when None
    pub temperature: Option<f32>,
    /// Per-call timeout
    pub timeout: Duration,
}

impl CompletionRequest {
    /// Render the base request payload. Remediation rebuilds attempts from
    /// this value, so it must stay free of any prior adjustment.
    pub fn to_payload(&self, stream: bool) -> Value {
        let mut payload = json!({
            "model": self.model,
            "messages": self.messages,
        });
        if let Some(effort) = &self.reasoning_effort {
            payload["reasoning"] = json!({ "effort": effort });
        }
        if let Some(tokens) = self.max_completion_tokens {
            payload["max_completion_tokens"] = json!(tokens);
        }
        if let Some(temperature) = self.temperature {
            payload["temperature"] = json!(temperature);
        }
        if stream {
            payload["stream"] = json!(true);
        }
        payload
    }
}

/// Produces embedding vectors
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Model identifier, recorded in snapshots for compatibility checks
    fn model(&self) -> &str;
}

/// Produces chat completions
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Model that generation calls run against. Probes the candidate list
    /// on first use and memoizes the winner for the process lifetime.
    async fn resolve_model(&self) -> String;

    /// Non-streaming completion, returning the provider's completion object
    async fn complete(&self, request: CompletionRequest) -> Result<Value>;

    /// Streaming completion, returning the provider's SSE byte stream
    async fn complete_stream(&self, request: CompletionRequest) -> Result<EventByteStream>;
}
