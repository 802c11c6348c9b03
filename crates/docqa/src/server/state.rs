//! Shared application state

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::config::AppConfig;
use crate::kb::{self, KnowledgeBase};
use crate::providers::{CompletionProvider, EmbeddingProvider, OpenAiClient};

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Application configuration
    config: AppConfig,
    /// Embedding provider
    embedder: Arc<dyn EmbeddingProvider>,
    /// Completion provider
    completions: Arc<dyn CompletionProvider>,
    /// Knowledge base, built once on first use and shared afterwards
    knowledge_base: OnceCell<KnowledgeBase>,
}

impl AppState {
    /// Create state backed by the OpenAI-compatible client. The same
    /// client serves both the embedding and completion roles.
    pub fn new(config: AppConfig) -> Self {
        let client = Arc::new(OpenAiClient::new(config.provider.clone()));
        Self::with_providers(config, client.clone(), client)
    }

    /// Create state with explicit providers
    pub fn with_providers(
        config: AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        completions: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                embedder,
                completions,
                knowledge_base: OnceCell::new(),
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get the embedding provider
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedder
    }

    /// Get the completion provider
    pub fn completions(&self) -> &Arc<dyn CompletionProvider> {
        &self.inner.completions
    }

    /// The knowledge base, building it on first access. Concurrent first
    /// requests share one build; a failed build yields an empty base
    /// rather than an error, so the cell is always filled.
    pub async fn knowledge_base(&self) -> &KnowledgeBase {
        self.inner
            .knowledge_base
            .get_or_init(|| kb::initialize(&self.inner.config, self.inner.embedder.as_ref()))
            .await
    }

    /// Whether the knowledge base has been built
    pub fn is_ready(&self) -> bool {
        self.inner.knowledge_base.get().is_some()
    }
}
