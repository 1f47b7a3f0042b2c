//! Caption banner rendering.
//!
//! The caption is laid out as SVG `<text>` and rasterized with resvg, so the
//! glyphs are vector outlines scaled to the banner rather than a bitmap font.

use super::{BANNER_HEIGHT, CANVAS_SIZE, LINE_HEIGHT};
use crate::models::DEFAULT_FONT_FAMILY;
use crate::{prompts, Error, Result};
use ::image::{Rgba, RgbaImage};
use resvg::usvg::fontdb;
use resvg::{tiny_skia, usvg};
use std::path::Path;
use std::sync::Arc;

/// Left edge of every caption line.
const TEXT_X: u32 = 10;
/// Baseline of the first caption line.
const TEXT_BASELINE: u32 = 30;
/// Tried in order when the configured family is not installed.
const FALLBACK_FAMILIES: &[&str] = &[
    "DejaVu Sans",
    "Liberation Sans",
    "Noto Sans",
    "Helvetica",
    "FreeSans",
];

#[derive(Debug, Clone, PartialEq)]
pub struct FontSettings {
    pub family: String,
    pub size: u32,
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            family: DEFAULT_FONT_FAMILY.to_string(),
            size: LINE_HEIGHT,
        }
    }
}

/// Rasterizes captions into transparent 1024x512 banners.
pub struct BannerRenderer {
    fontdb: Arc<fontdb::Database>,
    settings: FontSettings,
}

impl BannerRenderer {
    pub fn new(settings: FontSettings, fontdb: fontdb::Database) -> Self {
        Self {
            fontdb: Arc::new(fontdb),
            settings,
        }
    }

    /// Loads the host's system fonts plus an optional extra font file.
    pub fn with_system_fonts(settings: FontSettings, font_path: Option<&Path>) -> Result<Self> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        if let Some(path) = font_path {
            db.load_font_file(path)?;
            tracing::info!("Loaded caption font from {}", path.display());
        }
        Self::with_fonts(settings, db)
    }

    /// Like [`BannerRenderer::new`], but guarantees captions resolve to an
    /// installed face.
    ///
    /// The generic `sans-serif` family is pointed at the configured family
    /// when present, otherwise at the first installed fallback. A database
    /// with no usable face is an error, since every banner would be blank.
    pub fn with_fonts(settings: FontSettings, mut db: fontdb::Database) -> Result<Self> {
        let resolved = resolve_caption_family(&db, &settings.family).ok_or_else(|| {
            Error::Render(format!(
                "No installed font can render captions (wanted '{}', {} faces loaded)",
                settings.family,
                db.len()
            ))
        })?;

        if resolved != settings.family {
            tracing::warn!(
                "Caption font '{}' is not installed, falling back to '{}'",
                settings.family,
                resolved
            );
        }
        db.set_sans_serif_family(resolved.clone());
        tracing::info!(
            "Caption font database ready ({} faces, family {})",
            db.len(),
            resolved
        );
        Ok(Self::new(settings, db))
    }

    pub fn settings(&self) -> &FontSettings {
        &self.settings
    }

    /// Builds the SVG document for `caption`, one `<text>` element per line.
    pub fn svg_for(&self, caption: &str) -> String {
        let lines: String = caption
            .split('\n')
            .enumerate()
            .filter_map(|(index, line)| {
                let line: String = line.chars().filter(|c| !c.is_control()).collect();
                if line.trim().is_empty() {
                    return None;
                }
                let baseline = TEXT_BASELINE as usize + index * LINE_HEIGHT as usize;
                Some(format!(
                    r#"<text x="{}" y="{}">{}</text>"#,
                    TEXT_X,
                    baseline,
                    html_escape::encode_text(&line)
                ))
            })
            .collect();

        prompts::render(
            prompts::CAPTION_SVG,
            &[
                ("width", &CANVAS_SIZE.to_string()),
                ("height", &BANNER_HEIGHT.to_string()),
                (
                    "font_family",
                    &html_escape::encode_double_quoted_attribute(&self.settings.family),
                ),
                ("font_size", &self.settings.size.to_string()),
                ("lines", &lines),
            ],
        )
    }

    pub fn render(&self, caption: &str) -> Result<RgbaImage> {
        let svg = self.svg_for(caption);

        let mut options = usvg::Options::default();
        options.fontdb = Arc::clone(&self.fontdb);
        options.font_family = self.settings.family.clone();

        let tree = usvg::Tree::from_str(&svg, &options)
            .map_err(|e| Error::Render(format!("Invalid caption SVG: {}", e)))?;

        let mut pixmap = tiny_skia::Pixmap::new(CANVAS_SIZE, BANNER_HEIGHT)
            .ok_or_else(|| Error::Invariant("Banner pixmap has zero size".to_string()))?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        // tiny-skia stores premultiplied alpha; image expects straight alpha.
        let mut banner = RgbaImage::new(CANVAS_SIZE, BANNER_HEIGHT);
        for (dst, src) in banner.pixels_mut().zip(pixmap.pixels()) {
            let color = src.demultiply();
            *dst = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
        }

        Ok(banner)
    }
}

fn has_family(db: &fontdb::Database, family: &str) -> bool {
    db.query(&fontdb::Query {
        families: &[fontdb::Family::Name(family)],
        ..Default::default()
    })
    .is_some()
}

/// Picks the family captions should render with, if any face is installed.
fn resolve_caption_family(db: &fontdb::Database, wanted: &str) -> Option<String> {
    if has_family(db, wanted) {
        return Some(wanted.to_string());
    }
    if let Some(name) = FALLBACK_FAMILIES.iter().find(|name| has_family(db, name)) {
        return Some(name.to_string());
    }

    // Prefer proportional faces, but any face beats a blank banner.
    let first_family = |proportional_only: bool| {
        db.faces()
            .filter(|face| !proportional_only || !face.monospaced)
            .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
    };
    first_family(true).or_else(|| first_family(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TUFFY: &[u8] = include_bytes!("../../tests/fonts/Tuffy.ttf");

    fn renderer() -> BannerRenderer {
        BannerRenderer::new(FontSettings::default(), fontdb::Database::new())
    }

    fn tuffy_db() -> fontdb::Database {
        let mut db = fontdb::Database::new();
        db.load_font_data(TUFFY.to_vec());
        db
    }

    /// Opaque, dark pixels inside the given rows.
    fn inked_pixels(banner: &RgbaImage, rows: std::ops::Range<u32>) -> usize {
        banner
            .enumerate_pixels()
            .filter(|(_, y, p)| rows.contains(y) && p[3] > 128 && p[0] < 100)
            .count()
    }

    #[test]
    fn test_missing_family_falls_back_to_installed_face() {
        // Arial is absent from the database, as on most Linux hosts.
        let renderer = BannerRenderer::with_fonts(FontSettings::default(), tuffy_db()).unwrap();

        let banner = renderer.render("cool cat, no regrets").unwrap();

        assert!(inked_pixels(&banner, 0..74) > 0);
        assert_eq!(inked_pixels(&banner, 74..BANNER_HEIGHT), 0);
        // Glyphs start near the (10, 30) anchor.
        let near_anchor = banner
            .enumerate_pixels()
            .any(|(x, y, p)| (10..60).contains(&x) && (10..36).contains(&y) && p[3] > 128);
        assert!(near_anchor);
    }

    #[test]
    fn test_configured_family_is_used_when_installed() {
        let settings = FontSettings {
            family: "Tuffy".to_string(),
            ..FontSettings::default()
        };
        let renderer = BannerRenderer::with_fonts(settings, tuffy_db()).unwrap();

        assert!(inked_pixels(&renderer.render("hello").unwrap(), 0..74) > 0);
    }

    #[test]
    fn test_resolve_caption_family_order() {
        let db = tuffy_db();
        assert_eq!(resolve_caption_family(&db, "Tuffy").as_deref(), Some("Tuffy"));
        assert_eq!(resolve_caption_family(&db, "Arial").as_deref(), Some("Tuffy"));
        assert_eq!(resolve_caption_family(&fontdb::Database::new(), "Arial"), None);
    }

    #[test]
    fn test_empty_font_database_is_rejected() {
        let result = BannerRenderer::with_fonts(FontSettings::default(), fontdb::Database::new());
        assert!(matches!(result, Err(Error::Render(_))));
    }

    #[test]
    fn test_second_line_is_drawn_one_line_lower() {
        let renderer = BannerRenderer::with_fonts(FontSettings::default(), tuffy_db()).unwrap();

        let banner = renderer.render("\nlower").unwrap();

        assert_eq!(inked_pixels(&banner, 0..30), 0);
        assert!(inked_pixels(&banner, 30..62) > 0);
    }

    #[test]
    fn test_svg_places_each_line_one_line_height_apart() {
        let svg = renderer().svg_for("first\nsecond");

        assert!(svg.contains(r#"<text x="10" y="30">first</text>"#));
        assert!(svg.contains(r#"<text x="10" y="54">second</text>"#));
        assert!(svg.contains(r#"font-size="24""#));
        assert!(svg.contains(r#"font-family="Arial, sans-serif""#));
    }

    #[test]
    fn test_svg_escapes_markup_in_caption() {
        let svg = renderer().svg_for("<b>cats & dogs</b>");

        assert!(svg.contains("&lt;b&gt;cats &amp; dogs&lt;/b&gt;"));
        assert!(!svg.contains("<b>"));
    }

    #[test]
    fn test_svg_skips_blank_lines_but_keeps_spacing() {
        let svg = renderer().svg_for("top\n\nbottom");

        assert!(svg.contains(r#"y="30">top"#));
        assert!(svg.contains(r#"y="78">bottom"#));
        assert_eq!(svg.matches("<text").count(), 2);
    }

    #[test]
    fn test_render_produces_transparent_banner_of_fixed_size() {
        let banner = renderer().render("cool cat, no regrets").unwrap();

        assert_eq!(banner.dimensions(), (CANVAS_SIZE, BANNER_HEIGHT));
        // Corner is far from the text anchor.
        assert_eq!(banner.get_pixel(CANVAS_SIZE - 1, BANNER_HEIGHT - 1)[3], 0);
    }

    #[test]
    fn test_render_accepts_hostile_caption() {
        let banner = renderer()
            .render("</text><script>alert(1)</script>\u{0}\"'&")
            .unwrap();
        assert_eq!(banner.dimensions(), (CANVAS_SIZE, BANNER_HEIGHT));
    }

    #[test]
    fn test_render_empty_caption() {
        let banner = renderer().render("").unwrap();
        assert!(banner.pixels().all(|p| p[3] == 0));
    }
}
