use axum::extract::State;
use std::sync::Arc;

use super::prompts::{fix_food_prompt, FIX_FOOD_SYSTEM_PROMPT};
use super::{document_response, non_blank, parse_body, DocumentResponse};
use crate::error::RelayError;
use crate::models::FixFoodRequest;
use crate::server::AppState;
use crate::services::{ChatMessage, CompletionRequest};

pub async fn fix_food(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<DocumentResponse, RelayError> {
    log::info!("🔧 Fix food endpoint called");
    let ai = state.completion()?;

    let request: FixFoodRequest = parse_body("fix-food", &body)?;
    let has_input = non_blank(request.query.as_deref()).is_some()
        || non_blank(request.instructions.as_deref()).is_some()
        || request.food_data.is_some();
    if !has_input {
        return Err(RelayError::MissingField(
            "Query, instructions or food data is required",
        ));
    }

    let prompt = fix_food_prompt(&request);
    log::debug!("📝 Fix food prompt: {} chars", prompt.len());

    let content = ai
        .complete(CompletionRequest {
            messages: vec![
                ChatMessage::system(FIX_FOOD_SYSTEM_PROMPT),
                ChatMessage::user(prompt),
            ],
            temperature: Some(0.3),
            max_tokens: None,
            json_response: true,
        })
        .await
        .map_err(RelayError::with_upstream_details)?;

    document_response(content)
}
