//! Retrieval over the knowledge base

pub mod expansion;
pub mod mmr;
pub mod similarity;

use futures_util::future::try_join_all;

use crate::config::AppConfig;
use crate::context::{self, ContextPiece};
use crate::error::Result;
use crate::kb::{raw, KnowledgeBase};
use crate::providers::{CompletionProvider, EmbeddingProvider};

use mmr::ScoredIndex;

/// Retrieval outcome for one question
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedContext {
    /// Packed context, possibly empty
    pub context: String,
    /// Whether the answer may be framed as grounded in the context
    pub grounded: bool,
}

impl RetrievedContext {
    fn ungrounded() -> Self {
        Self {
            context: String::new(),
            grounded: false,
        }
    }
}

/// Build the context for a question.
///
/// A raw base packs whole documents in corpus order and is grounded
/// whenever the packed context is non-empty. An embedded base expands the
/// question, scores every chunk by its best similarity to any phrasing,
/// ranks, selects, and packs; it is grounded only when the context is
/// non-empty and the best score clears the configured floor. Expansion
/// failures quietly reduce to the question alone; query embedding
/// failures propagate.
pub async fn retrieve(
    kb: &KnowledgeBase,
    question: &str,
    embedder: &dyn EmbeddingProvider,
    completions: &dyn CompletionProvider,
    config: &AppConfig,
) -> Result<RetrievedContext> {
    let retrieval = &config.retrieval;

    let chunks = match kb {
        KnowledgeBase::Raw(docs) => {
            let pieces = raw::raw_context_pieces(docs);
            let context = context::pack(&pieces, retrieval.context_char_budget);
            let grounded = !context.is_empty();
            tracing::debug!(grounded, documents = docs.len(), "packed raw context");
            return Ok(RetrievedContext { context, grounded });
        }
        KnowledgeBase::Embedded(chunks) => chunks,
    };

    if chunks.is_empty() {
        return Ok(RetrievedContext::ungrounded());
    }

    let variants = if retrieval.use_query_expansion {
        expansion::expand_query(
            completions,
            &config.provider,
            question,
            retrieval.max_query_variants,
        )
        .await
    } else {
        vec![question.to_string()]
    };

    let query_embeddings =
        try_join_all(variants.iter().map(|variant| embedder.embed(variant))).await?;

    let mut ranked: Vec<ScoredIndex> = chunks
        .iter()
        .enumerate()
        .map(|(idx, chunk)| {
            let mut best = f32::NEG_INFINITY;
            for query in &query_embeddings {
                let score = similarity::cosine_similarity(query, &chunk.embedding);
                if score > best {
                    best = score;
                }
            }
            ScoredIndex { idx, score: best }
        })
        .collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let best_score = ranked.first().map(|entry| entry.score);

    let selected: Vec<usize> = if retrieval.use_mmr {
        let embeddings: Vec<&[f32]> = chunks.iter().map(|c| c.embedding.as_slice()).collect();
        mmr::mmr_select(&ranked, &embeddings, retrieval.top_k, retrieval.mmr_lambda)
    } else {
        ranked
            .iter()
            .take(retrieval.top_k)
            .map(|entry| entry.idx)
            .collect()
    };

    let pieces: Vec<ContextPiece> = selected
        .iter()
        .map(|&idx| ContextPiece {
            source: chunks[idx].source.clone(),
            text: chunks[idx].text.clone(),
        })
        .collect();
    let context = context::pack(&pieces, retrieval.context_char_budget);

    let grounded = !context.is_empty()
        && best_score.map_or(false, |score| score >= retrieval.score_threshold);
    tracing::debug!(
        grounded,
        best_score = best_score.unwrap_or(0.0),
        selected = selected.len(),
        "packed retrieved context"
    );

    Ok(RetrievedContext { context, grounded })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::providers::{CompletionRequest, EventByteStream};
    use crate::types::KbChunk;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    /// Embeds known phrases onto fixed axes so similarity is predictable.
    struct AxisEmbedder;

    fn axis_vector(text: &str) -> Vec<f32> {
        match text {
            t if t.contains("cat") => vec![1.0, 0.0, 0.0],
            t if t.contains("dog") => vec![0.0, 1.0, 0.0],
            t if t.contains("fish") => vec![0.0, 0.0, 1.0],
            _ => vec![0.5, 0.5, 0.0],
        }
    }

    #[async_trait]
    impl EmbeddingProvider for AxisEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(axis_vector(text))
        }

        fn model(&self) -> &str {
            "axis-embedder"
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(Error::upstream("OpenAI /embeddings 500: boom"))
        }

        fn model(&self) -> &str {
            "failing-embedder"
        }
    }

    struct NoExpansion;

    #[async_trait]
    impl CompletionProvider for NoExpansion {
        async fn resolve_model(&self) -> String {
            "gpt-5".to_string()
        }

        async fn complete(&self, _request: CompletionRequest) -> Result<Value> {
            Err(Error::upstream("OpenAI /chat/completions 500: down"))
        }

        async fn complete_stream(&self, _request: CompletionRequest) -> Result<EventByteStream> {
            Err(Error::upstream("not scripted"))
        }
    }

    struct ExpandsTo(&'static str);

    #[async_trait]
    impl CompletionProvider for ExpandsTo {
        async fn resolve_model(&self) -> String {
            "gpt-5".to_string()
        }

        async fn complete(&self, _request: CompletionRequest) -> Result<Value> {
            Ok(json!({
                "model": "gpt-5",
                "choices": [{ "message": { "content": self.0 } }]
            }))
        }

        async fn complete_stream(&self, _request: CompletionRequest) -> Result<EventByteStream> {
            Err(Error::upstream("not scripted"))
        }
    }

    fn chunk(text: &str, source: &str) -> KbChunk {
        KbChunk {
            text: text.to_string(),
            source: source.to_string(),
            embedding: axis_vector(text),
        }
    }

    fn embedded_kb() -> KnowledgeBase {
        KnowledgeBase::Embedded(vec![
            chunk("the cat sleeps", "cats.txt"),
            chunk("the dog barks", "dogs.txt"),
            chunk("the fish swims", "fish.txt"),
        ])
    }

    #[tokio::test]
    async fn test_best_matching_chunk_leads_the_context() {
        let config = AppConfig::default();
        let retrieved = retrieve(
            &embedded_kb(),
            "why does the cat sleep",
            &AxisEmbedder,
            &NoExpansion,
            &config,
        )
        .await
        .unwrap();

        assert!(retrieved.grounded);
        assert!(retrieved.context.starts_with("Source: cats.txt\nthe cat sleeps"));
    }

    #[tokio::test]
    async fn test_expansion_phrasings_widen_recall() {
        // The question embeds onto no axis, but an expansion phrasing
        // mentioning the dog pulls dogs.txt to the top.
        let config = AppConfig::default();
        let retrieved = retrieve(
            &embedded_kb(),
            "who is barking",
            &AxisEmbedder,
            &ExpandsTo("is the dog barking"),
            &config,
        )
        .await
        .unwrap();

        assert!(retrieved.context.starts_with("Source: dogs.txt\nthe dog barks"));
    }

    #[tokio::test]
    async fn test_empty_base_yields_ungrounded_without_provider_calls() {
        let config = AppConfig::default();
        let retrieved = retrieve(
            &KnowledgeBase::Embedded(Vec::new()),
            "anything",
            &FailingEmbedder,
            &NoExpansion,
            &config,
        )
        .await
        .unwrap();

        assert_eq!(retrieved, RetrievedContext::ungrounded());
    }

    #[tokio::test]
    async fn test_query_embedding_failure_propagates() {
        let config = AppConfig::default();
        let result = retrieve(
            &embedded_kb(),
            "question",
            &FailingEmbedder,
            &NoExpansion,
            &config,
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_low_score_context_is_not_grounded() {
        let mut config = AppConfig::default();
        config.retrieval.score_threshold = 0.99;
        let retrieved = retrieve(
            &embedded_kb(),
            "something unrelated entirely",
            &AxisEmbedder,
            &NoExpansion,
            &config,
        )
        .await
        .unwrap();

        assert!(!retrieved.context.is_empty());
        assert!(!retrieved.grounded);
    }

    #[tokio::test]
    async fn test_raw_base_packs_documents_in_corpus_order() {
        let config = AppConfig::default();
        let kb = KnowledgeBase::Raw(vec![
            crate::kb::raw::RawDoc {
                name: "a.pdf".to_string(),
                text: "first".to_string(),
            },
            crate::kb::raw::RawDoc {
                name: "b.pdf".to_string(),
                text: "second".to_string(),
            },
        ]);
        let retrieved = retrieve(&kb, "ignored", &FailingEmbedder, &NoExpansion, &config)
            .await
            .unwrap();

        assert!(retrieved.grounded);
        assert_eq!(
            retrieved.context,
            "Source: a.pdf\nfirst\n---\nSource: b.pdf\nsecond"
        );
    }

    #[tokio::test]
    async fn test_raw_base_with_no_text_is_not_grounded() {
        let config = AppConfig::default();
        let kb = KnowledgeBase::Raw(vec![crate::kb::raw::RawDoc {
            name: "empty.pdf".to_string(),
            text: String::new(),
        }]);
        let retrieved = retrieve(&kb, "ignored", &FailingEmbedder, &NoExpansion, &config)
            .await
            .unwrap();

        assert_eq!(retrieved, RetrievedContext::ungrounded());
    }

    #[tokio::test]
    async fn test_plain_top_k_keeps_rank_order() {
        let mut config = AppConfig::default();
        config.retrieval.use_mmr = false;
        config.retrieval.top_k = 2;
        let retrieved = retrieve(
            &embedded_kb(),
            "cat",
            &AxisEmbedder,
            &NoExpansion,
            &config,
        )
        .await
        .unwrap();

        let sections: Vec<&str> = retrieved.context.split("\n---\n").collect();
        assert_eq!(sections.len(), 2);
        assert!(sections[0].starts_with("Source: cats.txt"));
    }
}
