//! Streaming chat endpoint

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::{Error, Result};
use crate::retrieval;
use crate::server::state::AppState;
use crate::streaming;
use crate::types::ChatRequest;

/// Answer a question as a relayed SSE stream. Upstream frames pass
/// through unchanged apart from the attribution frame injected before
/// the terminal `[DONE]`.
pub async fn chat_stream(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Response> {
    let question = request
        .question()
        .ok_or_else(|| Error::client_input("Message is required"))?;

    let knowledge_base = state.knowledge_base().await;
    let retrieved = retrieval::retrieve(
        knowledge_base,
        question,
        state.embedder().as_ref(),
        state.completions().as_ref(),
        state.config(),
    )
    .await?;

    let completion_request =
        super::completion_request_for(&state, &request, question, &retrieved).await;

    let upstream = state
        .completions()
        .complete_stream(completion_request)
        .await?;
    let relayed = streaming::relay_stream(upstream);

    tracing::info!(grounded = retrieved.grounded, "streaming chat response");

    let headers = [
        (header::CONTENT_TYPE, "text/event-stream; charset=utf-8"),
        (header::CACHE_CONTROL, "no-cache, no-transform"),
        (header::CONNECTION, "keep-alive"),
    ];
    Ok((headers, Body::from_stream(relayed)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::providers::{
        CompletionProvider, CompletionRequest, EmbeddingProvider, EventByteStream,
    };
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use bytes::Bytes;
    use futures_util::{stream, StreamExt};
    use std::path::Path;
    use std::sync::Arc;

    struct ConstEmbedder;

    #[async_trait]
    impl EmbeddingProvider for ConstEmbedder {
        async fn embed(&self, _text: &str) -> crate::error::Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        fn model(&self) -> &str {
            "test-embed"
        }
    }

    struct StreamingCompletions {
        frames: Vec<Bytes>,
    }

    #[async_trait]
    impl CompletionProvider for StreamingCompletions {
        async fn resolve_model(&self) -> String {
            "resolved-model".to_string()
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> crate::error::Result<serde_json::Value> {
            Err(Error::upstream("not scripted"))
        }

        async fn complete_stream(
            &self,
            _request: CompletionRequest,
        ) -> crate::error::Result<EventByteStream> {
            let frames = self.frames.clone();
            Ok(stream::iter(frames.into_iter().map(Ok)).boxed())
        }
    }

    fn test_state(dir: &Path, frames: Vec<Bytes>) -> AppState {
        let mut config = AppConfig::default();
        config.corpus.dir = dir.to_path_buf();
        config.corpus.cache_path = dir.join("kb.json");
        config.corpus.raw_path = dir.join("kb-raw.json");
        config.retrieval.use_query_expansion = false;
        AppState::with_providers(
            config,
            Arc::new(ConstEmbedder),
            Arc::new(StreamingCompletions { frames }),
        )
    }

    fn ask(question: &str) -> ChatRequest {
        ChatRequest {
            message: Some(question.to_string()),
            history: None,
        }
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_message_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), Vec::new());

        let request = ChatRequest {
            message: None,
            history: None,
        };
        let response = chat_stream(State(state), Json(request))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stream_injects_attribution_before_done() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc.txt"), "X is 42").unwrap();
        let frames = vec![
            Bytes::from_static(
                b"data: {\"model\":\"gpt-5-mini\",\"choices\":[{\"delta\":{\"content\":\"Hi\"},\"index\":0,\"finish_reason\":null}]}\n\n",
            ),
            Bytes::from_static(b"data: [DONE]\n\n"),
        ];
        let state = test_state(dir.path(), frames);

        let response = chat_stream(State(state), Json(ask("What is X?")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("text/event-stream; charset=utf-8")
        );
        assert_eq!(
            response
                .headers()
                .get(header::CACHE_CONTROL)
                .and_then(|v| v.to_str().ok()),
            Some("no-cache, no-transform")
        );

        let text = body_text(response).await;
        let attribution = text
            .find("\\n\\n— model: gpt-5-mini")
            .expect("attribution frame present");
        let done = text.find("data: [DONE]").expect("terminal frame present");
        assert!(attribution < done);
        assert!(text.contains("\"content\":\"Hi\""));
    }

    #[tokio::test]
    async fn test_stream_without_done_still_attributes_at_end() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc.txt"), "X is 42").unwrap();
        let frames = vec![Bytes::from_static(
            b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"},\"index\":0,\"finish_reason\":null}]}\n\n",
        )];
        let state = test_state(dir.path(), frames);

        let response = chat_stream(State(state), Json(ask("What is X?")))
            .await
            .unwrap();
        let text = body_text(response).await;

        assert!(text.contains("\\n\\n— model: unknown-model"));
    }
}
