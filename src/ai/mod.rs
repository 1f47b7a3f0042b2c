//! AI service integration for caption and image generation
//!
//! Provides interfaces to Cohere's chat API for writing captions and
//! Stability AI's text-to-image API for painting the artwork.

pub mod cohere;
pub mod mock;
pub mod stability;

pub use cohere::CohereCaptionClient;
pub use mock::{MockCaptionClient, MockImageSynthesisClient};
pub use stability::StabilityImageClient;

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait CaptionService: Send + Sync {
    /// Returns a short one-line caption for `prompt`, or an empty string when
    /// the provider produced no text.
    async fn generate_caption(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
pub trait ImageSynthesisService: Send + Sync {
    /// Returns every encoded image the provider produced for `prompt`.
    async fn synthesize(&self, prompt: &str) -> Result<Vec<Vec<u8>>>;
}
