use super::types::{TextToImageRequest, TextToImageResponse};
use crate::models::{DEFAULT_STABILITY_API_HOST, DEFAULT_STABILITY_ENGINE_ID};
use crate::{Error, Result};
use reqwest::Client;
use std::time::Duration;

/// Lightweight Stability AI REST client.
pub struct StabilityHttpClient {
    client: Client,
    api_key: String,
    base_url: String,
    engine_id: String,
    timeout: Duration,
}

impl StabilityHttpClient {
    pub fn new_with_client(api_key: String, timeout: Duration, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_STABILITY_API_HOST.to_string(),
            engine_id: DEFAULT_STABILITY_ENGINE_ID.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_engine(mut self, engine_id: String) -> Self {
        self.engine_id = engine_id;
        self
    }

    pub fn engine_id(&self) -> &str {
        &self.engine_id
    }

    pub async fn text_to_image(&self, request: &TextToImageRequest) -> Result<TextToImageResponse> {
        let url = format!(
            "{}/v1/generation/{}/text-to-image",
            self.base_url, self.engine_id
        );
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("Accept", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Failed to send request to Stability: {}", e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::warn!("Stability API error (status {}): {}", status, error_text);
            return Err(Error::AiProvider(format!(
                "Non-200 response (status {}): {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            // Bodies carry whole base64 images, so only the size is logged.
            tracing::warn!(
                "Failed to parse Stability response ({} bytes): {}",
                body.len(),
                e
            );
            Error::AiProvider(format!("Failed to parse Stability response: {}", e))
        })
    }
}
