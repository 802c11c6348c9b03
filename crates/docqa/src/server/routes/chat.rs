//! Non-streaming chat endpoint

use axum::extract::State;
use axum::Json;

use crate::error::{Error, Result};
use crate::generation::{self, UNKNOWN_MODEL};
use crate::retrieval;
use crate::server::state::AppState;
use crate::types::{ChatRequest, ChatResponse};

/// Answer a question against the knowledge base
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
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
    let request_model = completion_request.model.clone();

    let completion = state.completions().complete(completion_request).await?;

    let mut reply = completion
        .pointer("/choices/0/message/content")
        .and_then(|content| content.as_str())
        .unwrap_or_default()
        .to_string();

    let mut model = completion
        .get("model")
        .and_then(|id| id.as_str())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or(request_model);
    if model.is_empty() {
        model = UNKNOWN_MODEL.to_string();
    }

    if !reply.is_empty() {
        reply.push_str(&generation::model_attribution(&model));
    }

    tracing::info!(model = %model, grounded = retrieved.grounded, "answered chat request");

    Ok(Json(ChatResponse { reply, model }))
}
