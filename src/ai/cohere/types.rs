//! Cohere chat request/response payloads.

use serde::{Deserialize, Serialize};

/// Request body for `POST /v1/chat`.
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// The subset of the chat response we read.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub text: Option<String>,
}
