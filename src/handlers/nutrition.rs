use axum::extract::State;
use std::sync::Arc;

use super::prompts::{nutrition_prompts, OperationType};
use super::{document_response, non_blank, parse_body, DocumentResponse};
use crate::error::RelayError;
use crate::models::NutritionRequest;
use crate::server::AppState;
use crate::services::{ChatMessage, CompletionRequest};

pub async fn nutrition(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<DocumentResponse, RelayError> {
    log::info!("🥗 Nutrition calculation endpoint called");
    let ai = state.completion()?;

    let request: NutritionRequest = parse_body("nutrition", &body)?;
    let food_name = non_blank(request.food_name.as_deref())
        .ok_or(RelayError::MissingField("Food name is required"))?;

    let operation = request.operation_type.as_deref().and_then(OperationType::parse);
    log::info!(
        "Food name: {}, serving size: {:?}, operation: {:?}",
        food_name,
        request.serving_size,
        operation
    );

    let (system, user) = nutrition_prompts(
        food_name,
        request.serving_size.as_deref(),
        operation,
        request.instructions.as_deref(),
        request.current_data.as_ref(),
    );

    let content = ai
        .complete(CompletionRequest {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: Some(0.5),
            max_tokens: Some(1500),
            json_response: true,
        })
        .await
        .map_err(RelayError::with_upstream_details)?;

    document_response(content)
}
