use axum::extract::State;
use axum::Json;
use base64::{engine::general_purpose, Engine};
use std::sync::Arc;

use super::prompts::{ANALYZE_SYSTEM_PROMPT, ANALYZE_USER_PROMPT};
use super::{non_blank, parse_body};
use crate::error::RelayError;
use crate::models::{AnalyzeFoodRequest, ApiResponse, NutritionRecord};
use crate::nutrition::parser::truncate;
use crate::server::AppState;
use crate::services::{ChatMessage, CompletionRequest};

/// Size in bytes of the image inside a base64 `data:` URL.
fn decoded_image_size(image: &str) -> Option<usize> {
    let (header, payload) = image.strip_prefix("data:")?.split_once(',')?;
    if !header.ends_with(";base64") {
        return None;
    }
    general_purpose::STANDARD.decode(payload.trim()).ok().map(|bytes| bytes.len())
}

pub async fn analyze_food(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<ApiResponse<NutritionRecord>>, RelayError> {
    log::info!("📸 Analyze food endpoint called");
    let ai = state.completion()?;

    let request: AnalyzeFoodRequest = parse_body("analyze-food", &body)?;
    let image = non_blank(request.image.as_deref())
        .ok_or(RelayError::MissingField("Image data is required"))?;

    log::info!("🖼️ Received image data, length: {}", image.len());
    match decoded_image_size(image) {
        Some(bytes) => log::debug!("📊 Decoded image size: {} bytes", bytes),
        None => log::debug!("🔗 Image is not a base64 data URL: {}", truncate(image, 50)),
    }

    let content = ai
        .complete(CompletionRequest {
            messages: vec![
                ChatMessage::system(ANALYZE_SYSTEM_PROMPT),
                ChatMessage::user_with_image(ANALYZE_USER_PROMPT, image),
            ],
            temperature: Some(0.1),
            max_tokens: Some(1500),
            json_response: true,
        })
        .await?;

    let record = state.pipeline.analyze(&content);
    Ok(Json(ApiResponse::ok(record)))
}
