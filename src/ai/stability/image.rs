use super::client::StabilityHttpClient;
use super::types::{TextPrompt, TextToImageRequest};
use crate::ai::ImageSynthesisService;
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

pub const IMAGE_SIZE: u32 = 1024;
const CFG_SCALE: u32 = 8;
const STEPS: u32 = 50;
const SAMPLES: u32 = 1;

pub struct StabilityImageClient {
    http: StabilityHttpClient,
}

impl StabilityImageClient {
    pub fn new(api_key: String) -> Self {
        Self::new_with_client(api_key, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, client: reqwest::Client) -> Self {
        Self {
            http: StabilityHttpClient::new_with_client(api_key, Duration::from_secs(120), client),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    pub fn with_engine(mut self, engine_id: String) -> Self {
        self.http = self.http.with_engine(engine_id);
        self
    }
}

#[async_trait]
impl ImageSynthesisService for StabilityImageClient {
    async fn synthesize(&self, prompt: &str) -> Result<Vec<Vec<u8>>> {
        let request = TextToImageRequest {
            text_prompts: vec![TextPrompt {
                text: prompt.to_string(),
            }],
            cfg_scale: CFG_SCALE,
            height: IMAGE_SIZE,
            width: IMAGE_SIZE,
            steps: STEPS,
            samples: SAMPLES,
        };

        let response = self.http.text_to_image(&request).await?;

        if response.artifacts.is_empty() {
            return Err(Error::AiProvider(
                "No artifacts in Stability response".to_string(),
            ));
        }

        use base64::Engine as _;
        let images = response
            .artifacts
            .iter()
            .map(|artifact| {
                if !artifact.finished_cleanly() {
                    tracing::warn!(
                        "Stability sample (seed {:?}) finished with {:?}",
                        artifact.seed,
                        artifact.finish_reason
                    );
                }
                base64::engine::general_purpose::STANDARD
                    .decode(&artifact.base64)
                    .map_err(|e| {
                        Error::AiProvider(format!("Failed to decode Stability base64 image: {}", e))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            "Stability engine {} returned {} image(s)",
            self.http.engine_id(),
            images.len()
        );

        Ok(images)
    }
}
