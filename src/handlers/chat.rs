use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use super::parse_body;
use crate::error::RelayError;
use crate::models::{ChatReply, ChatRequestBody, ChunkedChatReply};
use crate::nutrition::chunk_words;
use crate::server::AppState;
use crate::services::{ChatMessage, CompletionRequest};

const CHAT_MAX_TOKENS: u32 = 2000;

/// Forwards the client's conversation as-is and returns the reply text.
async fn relay_conversation(state: &AppState, body: &str, route: &str) -> Result<String, RelayError> {
    let ai = state.completion()?;

    let request: ChatRequestBody = parse_body(route, body)?;
    let messages: Vec<ChatMessage> = request
        .messages
        .filter(|messages| !messages.is_empty())
        .ok_or(RelayError::MissingField("Messages array is required"))?
        .into_iter()
        .map(|m| ChatMessage::text(m.role, m.content))
        .collect();

    log::info!("💬 Relaying conversation with {} message(s)", messages.len());

    ai.complete(CompletionRequest {
        messages,
        max_tokens: Some(CHAT_MAX_TOKENS),
        ..Default::default()
    })
    .await
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<ChatReply>, RelayError> {
    let content = relay_conversation(&state, &body, "chat").await?;
    Ok(Json(ChatReply {
        success: true,
        content,
    }))
}

/// Same call as [`chat`], with the finished reply split into small chunks.
pub async fn chat_stream(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<ChunkedChatReply>, RelayError> {
    let content = relay_conversation(&state, &body, "chat/stream").await?;
    let chunks = chunk_words(&content, &mut rand::thread_rng());
    log::debug!("✂️ Split reply into {} chunk(s)", chunks.len());

    Ok(Json(ChunkedChatReply {
        success: true,
        chunks,
        full_content: content,
    }))
}
