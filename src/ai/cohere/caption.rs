use super::client::CohereHttpClient;
use super::types::ChatRequest;
use crate::ai::CaptionService;
use crate::{prompts, Result};
use async_trait::async_trait;
use std::time::Duration;

const MAX_TOKENS: u32 = 100;
const TEMPERATURE: f32 = 0.7;

pub struct CohereCaptionClient {
    http: CohereHttpClient,
}

impl CohereCaptionClient {
    pub fn new(api_key: String) -> Self {
        Self::new_with_client(api_key, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, client: reqwest::Client) -> Self {
        Self {
            http: CohereHttpClient::new_with_client(api_key, Duration::from_secs(30), client),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl CaptionService for CohereCaptionClient {
    async fn generate_caption(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            message: prompts::render(prompts::CAPTION, &[("prompt", prompt)]),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self.http.chat(&request).await?;
        let caption = response.text.unwrap_or_default();

        tracing::debug!("Cohere caption ({} chars): {}", caption.len(), caption);
        Ok(caption)
    }
}
