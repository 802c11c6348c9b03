//! OpenAI-compatible provider client
//!
//! One client serves embeddings and chat completions. Completion calls run
//! through a remediation loop that retries without parameters the upstream
//! rejects, and the generation model is picked once per process by probing
//! an ordered candidate list.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::OnceCell;

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::providers::remedy::{self, Remediation};
use crate::providers::{
    CompletionProvider, CompletionRequest, EmbeddingProvider, EventByteStream,
};

/// Characters of an upstream rejection body kept in diagnostics
const ERROR_BODY_LIMIT: usize = 500;

/// Completion attempts per call, the first included
const MAX_CALL_ATTEMPTS: usize = 3;

/// Client for an OpenAI-compatible API
pub struct OpenAiClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: ProviderConfig,
    /// Bearer token, from `OPENAI_API_KEY`
    api_key: String,
    /// Generation model memo, written by the first probe
    resolved_model: OnceCell<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiClient {
    /// Create a client. The API key comes from the environment so it never
    /// lands in configuration files.
    pub fn new(config: ProviderConfig) -> Self {
        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .build()
            .expect("Failed to create HTTP client");

        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        if api_key.is_empty() {
            tracing::warn!("OPENAI_API_KEY is not set; upstream calls will be rejected");
        }

        Self {
            client,
            config,
            api_key,
            resolved_model: OnceCell::new(),
        }
    }

    fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    /// POST a JSON payload and check the status. Rejections become an error
    /// carrying `OpenAI <path> <status>: <body>` with the body truncated;
    /// that text is what the remediation and availability classifiers see.
    async fn request(
        &self,
        path: &str,
        payload: &Value,
        timeout: Duration,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.config.base_url, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let truncated: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(Error::upstream(format!(
                "OpenAI {} {}: {}",
                path,
                status.as_u16(),
                truncated
            )));
        }

        Ok(response)
    }

    async fn post(&self, path: &str, payload: &Value, timeout: Duration) -> Result<Value> {
        let response = self.request(path, payload, timeout).await?;
        Ok(response.json().await?)
    }

    async fn probe_models(&self) -> String {
        let timeout = Duration::from_secs(self.config.probe_timeout_secs);
        select_generation_model(
            &self.config.model_candidates,
            &self.config.fallback_model,
            |model| async move {
                let payload = probe_payload(&model);
                self.post("/chat/completions", &payload, timeout).await
            },
        )
        .await
    }
}

/// Minimal request used to test whether a model answers at all
fn probe_payload(model: &str) -> Value {
    json!({
        "model": model,
        "messages": [
            { "role": "system", "content": "ping" },
            { "role": "user", "content": "ping" }
        ],
        "temperature": 0,
        "max_completion_tokens": 1,
    })
}

/// Probe `candidates` in order (duplicates skipped) and pick the generation
/// model. A candidate whose failure does not name it unavailable is selected
/// optimistically; when every candidate is reported unavailable `fallback`
/// is used without probing it.
async fn select_generation_model<F, Fut>(candidates: &[String], fallback: &str, probe: F) -> String
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Value>>,
{
    let mut seen: Vec<&str> = Vec::new();
    for candidate in candidates {
        if seen.contains(&candidate.as_str()) {
            continue;
        }
        seen.push(candidate);

        match probe(candidate.clone()).await {
            Ok(_) => {
                tracing::info!(model = %candidate, "resolved generation model");
                return candidate.clone();
            }
            Err(e) => {
                if !remedy::is_model_unavailable(&e.to_string()) {
                    tracing::warn!(
                        model = %candidate,
                        "probe failed without naming the model unavailable, selecting it: {}",
                        e
                    );
                    return candidate.clone();
                }
                tracing::debug!(model = %candidate, "candidate unavailable");
            }
        }
    }

    tracing::warn!(fallback, "every candidate model unavailable, using fallback");
    fallback.to_string()
}

/// Run `attempt` against payloads rebuilt from the immutable `base` plus
/// every remediation demanded so far. A rejection that demands nothing new
/// surfaces immediately; otherwise up to `MAX_CALL_ATTEMPTS` attempts run.
async fn call_with_remediation<F, Fut, T>(base: &Value, attempt: F) -> Result<T>
where
    F: Fn(Value) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut applied: Vec<Remediation> = Vec::new();
    let mut last_error: Option<Error> = None;

    for _ in 0..MAX_CALL_ATTEMPTS {
        let mut payload = base.clone();
        for remediation in &applied {
            remediation.apply(&mut payload);
        }
        let sent = payload.clone();

        match attempt(payload).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let demanded = remedy::plan(&e.to_string(), &sent);
                if demanded.is_empty() {
                    return Err(e);
                }
                tracing::warn!(
                    ?demanded,
                    "upstream rejected parameters, retrying without them"
                );
                applied.extend(demanded);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::upstream("chat completion failed")))
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let payload = json!({ "model": self.config.embed_model, "input": text });
        let value = self
            .post("/embeddings", &payload, self.default_timeout())
            .await?;
        let response: EmbeddingResponse = serde_json::from_value(value)?;
        response
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .ok_or_else(|| Error::upstream("embedding response carried no vectors"))
    }

    fn model(&self) -> &str {
        &self.config.embed_model
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn resolve_model(&self) -> String {
        self.resolved_model
            .get_or_init(|| self.probe_models())
            .await
            .clone()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Value> {
        let base = request.to_payload(false);
        call_with_remediation(&base, |payload| async move {
            self.post("/chat/completions", &payload, request.timeout)
                .await
        })
        .await
    }

    async fn complete_stream(&self, request: CompletionRequest) -> Result<EventByteStream> {
        let base = request.to_payload(true);
        let response = call_with_remediation(&base, |payload| async move {
            self.request("/chat/completions", &payload, request.timeout)
                .await
        })
        .await?;

        Ok(response.bytes_stream().map_err(Error::from).boxed())
    }
}
