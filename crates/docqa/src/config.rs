//! Configuration for the document QA service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Corpus and snapshot locations
    #[serde(default)]
    pub corpus: CorpusConfig,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Upstream provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// With an explicit path the file must exist and parse. Without one,
    /// `docqa.toml` in the working directory is used when present and the
    /// built-in defaults otherwise. `OPENAI_API_BASE` overrides the provider
    /// base URL in either case.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p).map_err(|e| {
                    Error::config(format!("failed to read {}: {}", p.display(), e))
                })?;
                toml::from_str(&raw)
                    .map_err(|e| Error::config(format!("failed to parse {}: {}", p.display(), e)))?
            }
            None => {
                let fallback = Path::new("docqa.toml");
                if fallback.exists() {
                    let raw = std::fs::read_to_string(fallback).map_err(|e| {
                        Error::config(format!("failed to read docqa.toml: {}", e))
                    })?;
                    toml::from_str(&raw)
                        .map_err(|e| Error::config(format!("failed to parse docqa.toml: {}", e)))?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(base) = std::env::var("OPENAI_API_BASE") {
            if !base.is_empty() {
                tracing::debug!("overriding provider base URL from OPENAI_API_BASE");
                config.provider.base_url = base;
            }
        }

        Ok(config)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number
    #[serde(default = "default_port")]
    pub port: u16,
    /// Enable permissive CORS
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_enable_cors() -> bool {
    true
}

/// Corpus and snapshot locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Directory holding the source documents
    #[serde(default = "default_corpus_dir")]
    pub dir: PathBuf,
    /// Path of the embedded knowledge-base snapshot
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
    /// Path of the raw full-text snapshot
    #[serde(default = "default_raw_path")]
    pub raw_path: PathBuf,
    /// Prefer the raw snapshot over embedding retrieval when present
    #[serde(default = "default_use_raw_kb")]
    pub use_raw_kb: bool,
    /// Skip source fingerprint re-validation when loading the snapshot.
    /// Meant for immutable deployment bundles where the corpus cannot
    /// drift from the snapshot.
    #[serde(default)]
    pub skip_fingerprint_check: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("docs"),
            cache_path: PathBuf::from("docs/kb_cache.json"),
            raw_path: PathBuf::from("docs/raw_kb.json"),
            use_raw_kb: true,
            skip_fingerprint_check: false,
        }
    }
}

fn default_corpus_dir() -> PathBuf {
    PathBuf::from("docs")
}
fn default_cache_path() -> PathBuf {
    PathBuf::from("docs/kb_cache.json")
}
fn default_raw_path() -> PathBuf {
    PathBuf::from("docs/raw_kb.json")
}
fn default_use_raw_kb() -> bool {
    true
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Chunk window size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters (must be < chunk_size)
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 2000,
            chunk_overlap: 200,
        }
    }
}

fn default_chunk_size() -> usize {
    2000
}
fn default_chunk_overlap() -> usize {
    200
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks selected per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Select chunks with maximal marginal relevance instead of plain top-k
    #[serde(default = "default_use_mmr")]
    pub use_mmr: bool,
    /// MMR relevance/diversity trade-off, 1.0 = pure relevance
    #[serde(default = "default_mmr_lambda")]
    pub mmr_lambda: f32,
    /// Best-score floor below which an answer is framed as inference
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
    /// Context budget in bytes
    #[serde(default = "default_context_budget")]
    pub context_char_budget: usize,
    /// Expand the query into alternate phrasings before retrieval
    #[serde(default = "default_use_query_expansion")]
    pub use_query_expansion: bool,
    /// Maximum number of alternate phrasings requested
    #[serde(default = "default_max_query_variants")]
    pub max_query_variants: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 8,
            use_mmr: true,
            mmr_lambda: 0.7,
            score_threshold: 0.22,
            context_char_budget: 240_000,
            use_query_expansion: true,
            max_query_variants: 4,
        }
    }
}

fn default_top_k() -> usize {
    8
}
fn default_use_mmr() -> bool {
    true
}
fn default_mmr_lambda() -> f32 {
    0.7
}
fn default_score_threshold() -> f32 {
    0.22
}
fn default_context_budget() -> usize {
    240_000
}
fn default_use_query_expansion() -> bool {
    true
}
fn default_max_query_variants() -> usize {
    4
}

/// Upstream provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// OpenAI-compatible API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Embedding model
    #[serde(default = "default_embed_model")]
    pub embed_model: String,
    /// Ordered completion-model candidates, probed at first use
    #[serde(default = "default_model_candidates")]
    pub model_candidates: Vec<String>,
    /// Fallback model when every candidate is unavailable
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,
    /// Model used for query expansion
    #[serde(default = "default_expansion_model")]
    pub expansion_model: String,
    /// Reasoning effort hint attached to completion calls, empty disables it
    #[serde(default = "default_reasoning_effort")]
    pub reasoning_effort: String,
    /// Maximum completion tokens per generation call
    #[serde(default = "default_max_completion_tokens")]
    pub max_completion_tokens: u32,
    /// Sampling temperature for generation calls
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Default request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Model-probe timeout in seconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
    /// Query-expansion timeout in seconds
    #[serde(default = "default_expansion_timeout")]
    pub expansion_timeout_secs: u64,
    /// Completion and streaming timeout in seconds
    #[serde(default = "default_completion_timeout")]
    pub completion_timeout_secs: u64,
    /// Parallel embedding requests during a cold knowledge-base build
    #[serde(default = "default_embed_concurrency")]
    pub embed_concurrency: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            embed_model: "text-embedding-3-small".to_string(),
            model_candidates: default_model_candidates(),
            fallback_model: "o3".to_string(),
            expansion_model: "gpt-5".to_string(),
            reasoning_effort: "high".to_string(),
            max_completion_tokens: 2500,
            temperature: 0.1,
            timeout_secs: 20,
            probe_timeout_secs: 8,
            expansion_timeout_secs: 60,
            completion_timeout_secs: 120,
            embed_concurrency: default_embed_concurrency(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_embed_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_model_candidates() -> Vec<String> {
    vec![
        "gpt-5-thinking".to_string(),
        "o4".to_string(),
        "o4-mini".to_string(),
        "o3".to_string(),
    ]
}
fn default_fallback_model() -> String {
    "o3".to_string()
}
fn default_expansion_model() -> String {
    "gpt-5".to_string()
}
fn default_reasoning_effort() -> String {
    "high".to_string()
}
fn default_max_completion_tokens() -> u32 {
    2500
}
fn default_temperature() -> f32 {
    0.1
}
fn default_timeout() -> u64 {
    20
}
fn default_probe_timeout() -> u64 {
    8
}
fn default_expansion_timeout() -> u64 {
    60
}
fn default_completion_timeout() -> u64 {
    120
}
fn default_embed_concurrency() -> usize {
    num_cpus::get().min(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_carry_pinned_constants() {
        let config = AppConfig::default();
        assert_eq!(config.chunking.chunk_size, 2000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.retrieval.top_k, 8);
        assert!((config.retrieval.mmr_lambda - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.provider.embed_model, "text-embedding-3-small");
        assert_eq!(config.provider.fallback_model, "o3");
    }

    #[test]
    fn test_partial_toml_fills_remaining_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9001\n\n[retrieval]\ntop_k = 3").unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 9001);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.chunking.chunk_size, 2000);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let err = AppConfig::load(Some(std::path::Path::new("/nonexistent/docqa.toml")));
        assert!(err.is_err());
    }
}
