use super::{BannerRenderer, CompositorService, CANVAS_SIZE, CAPTION_GAP, LINE_HEIGHT};
use crate::{Error, Result};
use ::image::{imageops, ImageFormat, Rgba, RgbaImage};
use async_trait::async_trait;
use std::io::Cursor;
use std::sync::Arc;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Vertical position of the artwork for a given caption.
///
/// Every `\n`-separated segment counts as one line, so an empty caption still
/// reserves one line and the artwork never starts above 74px.
pub fn image_offset(caption: &str) -> u32 {
    let lines = u32::try_from(caption.split('\n').count()).unwrap_or(u32::MAX);
    lines.saturating_mul(LINE_HEIGHT).saturating_add(CAPTION_GAP)
}

pub struct Compositor {
    banner: Arc<BannerRenderer>,
}

impl Compositor {
    pub fn new(banner: BannerRenderer) -> Self {
        Self {
            banner: Arc::new(banner),
        }
    }

    /// Blocking half of [`CompositorService::compose`].
    pub fn compose_sync(banner: &BannerRenderer, caption: &str, image: &[u8]) -> Result<Vec<u8>> {
        let offset = image_offset(caption);
        let banner_image = banner.render(caption)?;
        let artwork = ::image::load_from_memory(image)?.to_rgba8();

        tracing::debug!(
            "Compositing {}x{} artwork at y={}",
            artwork.width(),
            artwork.height(),
            offset
        );

        let mut canvas = RgbaImage::from_pixel(CANVAS_SIZE, CANVAS_SIZE, WHITE);
        imageops::overlay(&mut canvas, &banner_image, 0, 0);
        // No scaling: anything past the canvas edge is cropped by overlay.
        imageops::overlay(&mut canvas, &artwork, 0, i64::from(offset));

        let mut bytes = Vec::new();
        canvas.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

#[async_trait]
impl CompositorService for Compositor {
    async fn compose(&self, caption: &str, image: &[u8]) -> Result<Vec<u8>> {
        tokio::task::spawn_blocking({
            let banner = Arc::clone(&self.banner);
            let caption = caption.to_string();
            let image = image.to_vec();
            move || Self::compose_sync(&banner, &caption, &image)
        })
        .await
        .map_err(|e| Error::Invariant(format!("Compositing task join error: {}", e)))?
    }
}
