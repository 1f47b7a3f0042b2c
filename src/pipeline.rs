//! Caption, illustrate and composite one prompt.

use crate::ai::{CaptionService, CohereCaptionClient, ImageSynthesisService, StabilityImageClient};
use crate::image::{BannerRenderer, Compositor, CompositorService, FontSettings, LINE_HEIGHT};
use crate::models::{Config, GenerationRequest};
use crate::{Error, Result};
use std::path::Path;
use tracing::{error, info, Instrument};
use uuid::Uuid;

/// Shared generation pipeline consumed by every transport.
pub struct Pipeline {
    caption: Box<dyn CaptionService>,
    image_gen: Box<dyn ImageSynthesisService>,
    compositor: Box<dyn CompositorService>,
    parallel: bool,
}

/// Injectable service bundle used to construct [`Pipeline`] in tests/harnesses.
pub struct PipelineServices {
    pub caption: Box<dyn CaptionService>,
    pub image_gen: Box<dyn ImageSynthesisService>,
    pub compositor: Box<dyn CompositorService>,
}

impl Pipeline {
    /// Build a pipeline from concrete service dependencies.
    pub fn with_services(services: PipelineServices) -> Self {
        Self {
            caption: services.caption,
            image_gen: services.image_gen,
            compositor: services.compositor,
            parallel: false,
        }
    }

    /// Issue the caption and image calls concurrently instead of in order.
    pub fn with_parallel_generation(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Construct the production pipeline (Cohere, Stability, resvg banner).
    pub fn from_config(config: &Config) -> Result<Self> {
        // Reuse one HTTP connection pool across provider clients.
        let http_client = reqwest::Client::new();

        let caption = CohereCaptionClient::new_with_client(
            config.caption_api_key.clone(),
            http_client.clone(),
        )
        .with_base_url(config.cohere_api_base.clone());

        let image_gen =
            StabilityImageClient::new_with_client(config.image_api_key.clone(), http_client)
                .with_base_url(config.stability_api_host.clone())
                .with_engine(config.stability_engine_id.clone());
        info!(
            "Image provider: Stability (engine: {})",
            config.stability_engine_id
        );

        let banner = BannerRenderer::with_system_fonts(
            FontSettings {
                family: config.font_family.clone(),
                size: LINE_HEIGHT,
            },
            config.font_path.as_deref().map(Path::new),
        )?;

        Ok(Self::with_services(PipelineServices {
            caption: Box::new(caption),
            image_gen: Box::new(image_gen),
            compositor: Box::new(Compositor::new(banner)),
        })
        .with_parallel_generation(config.parallel_generation))
    }

    /// Run every stage for `request` and return the composited PNG.
    ///
    /// The first failing stage aborts the run; nothing partial is returned.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Vec<u8>> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("generate", %request_id);

        async {
            let result = self.run_stages(request).await;
            if let Err(e) = &result {
                error!("Generation failed: {}", e);
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_stages(&self, request: &GenerationRequest) -> Result<Vec<u8>> {
        request.validate()?;
        info!("Generating meme for prompt: {}", request.prompt);

        let (caption, images) = if self.parallel {
            tokio::try_join!(
                self.caption_stage(&request.prompt),
                self.image_stage(&request.prompt)
            )?
        } else {
            let caption = self.caption_stage(&request.prompt).await?;
            let images = self.image_stage(&request.prompt).await?;
            (caption, images)
        };

        let image = images
            .first()
            .ok_or_else(|| Error::AiProvider("Image service returned no samples".to_string()))?;
        if images.len() > 1 {
            info!("Using first of {} samples", images.len());
        }

        let composite = self.compositor.compose(&caption, image).await?;
        info!("Composited image ({} bytes)", composite.len());

        Ok(composite)
    }

    async fn caption_stage(&self, prompt: &str) -> Result<String> {
        let caption = self.caption.generate_caption(prompt).await?;
        info!("Generated caption ({} chars): {}", caption.len(), caption);
        Ok(caption)
    }

    async fn image_stage(&self, prompt: &str) -> Result<Vec<Vec<u8>>> {
        let images = self.image_gen.synthesize(prompt).await?;
        info!(
            "Generated {} image(s), first is {} bytes",
            images.len(),
            images.first().map_or(0, Vec::len)
        );
        Ok(images)
    }
}
