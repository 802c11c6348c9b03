//! Knowledge base assembly
//!
//! A knowledge base is either a set of raw documents served verbatim or a
//! set of embedded chunks served by similarity search. Raw snapshots win
//! when enabled and usable; otherwise a chunk snapshot is loaded when still
//! valid for the current corpus and settings, and the corpus is re-embedded
//! when it is not.

pub mod raw;
pub mod snapshot;

use futures_util::{stream, StreamExt, TryStreamExt};

use crate::config::AppConfig;
use crate::context;
use crate::corpus::chunker::Chunker;
use crate::corpus::extract;
use crate::corpus::loader::CorpusLoader;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::KbChunk;

use raw::{RawDoc, RawSnapshot};
use snapshot::KbSnapshot;

/// In-memory knowledge base
pub enum KnowledgeBase {
    /// Whole documents packed into the context verbatim, no retrieval
    Raw(Vec<RawDoc>),
    /// Embedded chunks ranked by similarity at query time
    Embedded(Vec<KbChunk>),
}

impl KnowledgeBase {
    pub fn is_empty(&self) -> bool {
        match self {
            KnowledgeBase::Raw(docs) => docs.is_empty(),
            KnowledgeBase::Embedded(chunks) => chunks.is_empty(),
        }
    }

    /// Human-readable shape for logs
    pub fn describe(&self) -> String {
        match self {
            KnowledgeBase::Raw(docs) => format!("{} raw documents", docs.len()),
            KnowledgeBase::Embedded(chunks) => format!("{} embedded chunks", chunks.len()),
        }
    }
}

/// Load or build the knowledge base. Every failure degrades to an empty
/// base with a warning so the server keeps answering without grounding.
pub async fn initialize(config: &AppConfig, embedder: &dyn EmbeddingProvider) -> KnowledgeBase {
    match load_or_build(config, embedder).await {
        Ok(kb) => {
            tracing::info!("knowledge base ready: {}", kb.describe());
            kb
        }
        Err(e) => {
            tracing::warn!("knowledge base unavailable, answering without grounding: {}", e);
            KnowledgeBase::Embedded(Vec::new())
        }
    }
}

async fn load_or_build(
    config: &AppConfig,
    embedder: &dyn EmbeddingProvider,
) -> Result<KnowledgeBase> {
    let corpus = &config.corpus;

    if corpus.use_raw_kb {
        if let Some(snapshot) = RawSnapshot::load(&corpus.raw_path) {
            let docs = snapshot.docs();
            let pieces = raw::raw_context_pieces(&docs);
            let trial = context::pack(&pieces, config.retrieval.context_char_budget);
            if !trial.is_empty() {
                tracing::info!(documents = docs.len(), "serving raw knowledge base");
                return Ok(KnowledgeBase::Raw(docs));
            }
            tracing::warn!("raw snapshot yields no usable context, falling back to embeddings");
        }
    }

    let loader = CorpusLoader::new(&corpus.dir);
    let chunker = Chunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;
    let cache_path = corpus.cache_path.as_path();

    if let Some(snapshot) = KbSnapshot::load(cache_path) {
        // An unreadable corpus reads as empty here, which skips the file
        // comparison and accepts the snapshot on model and settings alone.
        let current = if corpus.skip_fingerprint_check {
            None
        } else {
            Some(loader.fingerprints().unwrap_or_else(|e| {
                tracing::warn!("could not fingerprint corpus: {}", e);
                Vec::new()
            }))
        };
        if snapshot.is_valid_for(
            embedder.model(),
            chunker.size(),
            chunker.overlap(),
            current.as_deref(),
        ) {
            let chunks = snapshot.into_chunks();
            tracing::info!(chunks = chunks.len(), "loaded knowledge base snapshot");
            return Ok(KnowledgeBase::Embedded(chunks));
        }
        tracing::info!("knowledge base snapshot is stale, rebuilding");
    }

    let snapshot = build_snapshot(
        &loader,
        &chunker,
        embedder,
        config.provider.embed_concurrency,
    )
    .await?;
    snapshot.save(cache_path);
    Ok(KnowledgeBase::Embedded(snapshot.into_chunks()))
}

/// Chunk and embed every corpus file. An unreadable or unparseable file
/// fails the whole build, as does any embedding failure; callers decide
/// whether that degrades or aborts. Chunk order follows the sorted file
/// listing.
pub async fn build_snapshot(
    loader: &CorpusLoader,
    chunker: &Chunker,
    embedder: &dyn EmbeddingProvider,
    concurrency: usize,
) -> Result<KbSnapshot> {
    let names = loader.list();

    let mut pending: Vec<(String, String)> = Vec::new();
    for name in &names {
        let data = loader.read_bytes(name)?;
        let extracted = extract::extract(name, &data)?;
        for piece in chunker.chunk(&extracted.text) {
            pending.push((name.clone(), piece));
        }
    }

    tracing::info!(
        files = names.len(),
        chunks = pending.len(),
        "embedding corpus"
    );

    let chunks: Vec<KbChunk> = stream::iter(pending)
        .map(|(source, text)| async move {
            let embedding = embedder.embed(&text).await?;
            Ok::<KbChunk, Error>(KbChunk {
                text,
                source,
                embedding,
            })
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let source_files = loader.fingerprints().unwrap_or_else(|e| {
        tracing::warn!("could not fingerprint corpus for the snapshot: {}", e);
        Vec::new()
    });

    Ok(KbSnapshot::from_chunks(
        embedder.model(),
        chunker.size(),
        chunker.overlap(),
        source_files,
        &chunks,
    ))
}
