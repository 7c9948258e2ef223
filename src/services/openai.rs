use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use super::ai_service::{ChatCompletion, ChatMessage, CompletionRequest};
use crate::error::RelayError;
use crate::nutrition::parser::truncate;

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Chat-completion client for OpenAI and API-compatible providers.
pub struct OpenAIService {
    api_key: String,
    model: String,
    api_url: String,
    client: reqwest::Client,
}

impl OpenAIService {
    pub fn new(api_key: String, model: String, api_url: String) -> Self {
        Self {
            api_key,
            model,
            api_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request<'a>(&'a self, request: &'a CompletionRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json_response.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        }
    }
}

fn extract_content(response_text: &str) -> Result<String, RelayError> {
    let chat_response: ChatResponse = serde_json::from_str(response_text).map_err(|e| {
        log::error!("❌ Could not decode OpenAI response: {}", e);
        RelayError::InvalidUpstream
    })?;

    chat_response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or(RelayError::InvalidUpstream)
}

#[async_trait::async_trait]
impl ChatCompletion for OpenAIService {
    async fn complete(&self, request: CompletionRequest) -> Result<String, RelayError> {
        let body = self.build_request(&request);

        log::info!(
            "🤖 Sending request to OpenAI with model: {} ({} message(s))",
            self.model,
            request.messages.len()
        );
        if let Ok(payload) = serde_json::to_string(&body) {
            log::debug!("📤 Request payload size: {} bytes", payload.len());
        }

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        log::info!("📥 OpenAI response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("❌ OpenAI API error response: {}", error_text);
            return Err(RelayError::Upstream {
                status: StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
                body: error_text,
                expose_body: false,
            });
        }

        let response_text = response.text().await?;
        log::debug!("📄 Raw OpenAI response size: {} bytes", response_text.len());

        let content = extract_content(&response_text)?;
        log::info!("💬 OpenAI response content: {}", truncate(&content, 200));

        Ok(content)
    }
}
