//! Stability AI text-to-image payloads.

use serde::{Deserialize, Serialize};

/// Request body for `POST /v1/generation/{engine}/text-to-image`.
#[derive(Debug, Serialize)]
pub struct TextToImageRequest {
    pub text_prompts: Vec<TextPrompt>,
    pub cfg_scale: u32,
    pub height: u32,
    pub width: u32,
    pub steps: u32,
    pub samples: u32,
}

#[derive(Debug, Serialize)]
pub struct TextPrompt {
    pub text: String,
}

/// Top-level text-to-image response.
#[derive(Debug, Deserialize)]
pub struct TextToImageResponse {
    pub artifacts: Vec<Artifact>,
}

/// One generated sample, base64 encoded.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub base64: String,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl Artifact {
    /// False when Stability altered the sample, e.g. `CONTENT_FILTERED` blurs it.
    pub fn finished_cleanly(&self) -> bool {
        self.finish_reason
            .as_deref()
            .map_or(true, |reason| reason == "SUCCESS")
    }
}
