pub mod analyze_food;
pub mod chat;
pub mod fix_food;
pub mod nutrition;
pub mod prompts;

pub use analyze_food::analyze_food;
pub use chat::{chat, chat_stream};
pub use fix_food::fix_food;
pub use nutrition::nutrition;

use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::RelayError;
use crate::models::ApiResponse;
use crate::nutrition::parser::truncate;
use crate::nutrition::{canonicalize_document, parse_json};

pub type DocumentResponse = Json<ApiResponse<Map<String, Value>>>;

/// Deserializes a raw request body, logging a bounded prefix of it.
pub(crate) fn parse_body<T: DeserializeOwned>(route: &str, body: &str) -> Result<T, RelayError> {
    log::debug!("📦 {} body: {}", route, truncate(body, 200));
    let body = if body.trim().is_empty() { "{}" } else { body };
    serde_json::from_str(body).map_err(RelayError::InvalidBody)
}

/// Model output for the document routes must contain a JSON object.
pub(crate) fn document_response(content: String) -> Result<DocumentResponse, RelayError> {
    match parse_json(&content) {
        Some(document) => {
            log::info!("✅ Parsed nutrition document with {} field(s)", document.len());
            Ok(Json(ApiResponse::ok(canonicalize_document(document))))
        }
        None => Err(RelayError::Unparseable { raw: content }),
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
