use super::types::{ChatRequest, ChatResponse};
use crate::models::DEFAULT_COHERE_API_BASE;
use crate::{Error, Result};
use reqwest::Client;
use std::time::Duration;

/// Lightweight Cohere REST client used by the caption module.
pub struct CohereHttpClient {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl CohereHttpClient {
    pub fn new_with_client(api_key: String, timeout: Duration, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_COHERE_API_BASE.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/v1/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Failed to send request to Cohere: {}", e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::warn!("Cohere API error (status {}): {}", status, error_text);
            return Err(Error::AiProvider(format!(
                "Cohere API error (status {}): {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!("Failed to parse Cohere response: {}\nBody: {}", e, body);
            Error::AiProvider(format!("Failed to parse Cohere response: {}", e))
        })
    }
}
