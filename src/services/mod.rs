pub mod ai_service;
pub mod openai; // OpenAI-compatible chat completions

pub use ai_service::{ChatCompletion, ChatMessage, CompletionRequest};
pub use openai::OpenAIService;
