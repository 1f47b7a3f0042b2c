//! Caption and artwork compositing
//!
//! Renders the caption into a transparent banner and stacks it above the
//! synthesized image on a fixed white canvas, producing one PNG per request.

pub mod banner;
pub mod compositor;
pub mod mock;

pub use banner::{BannerRenderer, FontSettings};
pub use compositor::{image_offset, Compositor};
pub use mock::MockCompositor;

use crate::Result;
use async_trait::async_trait;

/// Width and height of the composited output.
pub const CANVAS_SIZE: u32 = 1024;
/// Height of the intermediate caption banner.
pub const BANNER_HEIGHT: u32 = 512;
/// Assumed rendered line height, matching the caption font size.
pub const LINE_HEIGHT: u32 = 24;
/// Space between the caption block and the artwork.
pub const CAPTION_GAP: u32 = 50;

#[async_trait]
pub trait CompositorService: Send + Sync {
    /// Stacks `caption` above `image` and returns the PNG-encoded canvas.
    async fn compose(&self, caption: &str, image: &[u8]) -> Result<Vec<u8>>;
}
