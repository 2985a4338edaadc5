//! Software text renderer using tiny-skia and cosmic-text
//!
//! Both backends hand the renderer a plain RGBA buffer sized to the overlay
//! surface. All rendering happens on the CPU; output is premultiplied RGBA.

use activate_types::DrawOptions;
use cosmic_text::{
    Attrs, Buffer, Color as CosmicColor, Family, FontSystem, Metrics, Shaping, Style,
    SwashCache, SwashContent, Weight,
};
use tiny_skia::{Color, PixmapMut};
use tracing::debug;

/// Title and subtitle geometry before scaling
const TEXT_LEFT: f32 = 20.0;
const TITLE_BASELINE: f32 = 30.0;
const TITLE_FONT_SIZE: f32 = 24.0;
const SUBTITLE_BASELINE: f32 = 55.0;
const SUBTITLE_FONT_SIZE: f32 = 16.0;
const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Position and size of one line of text, in surface pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLine {
    pub x: f32,
    pub baseline: f32,
    pub font_size: f32,
}

/// Where everything goes on the overlay surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayout {
    pub width: u32,
    pub height: u32,
    pub title: TextLine,
    pub subtitle: TextLine,
}

impl TextLayout {
    pub fn compute(options: &DrawOptions) -> Self {
        let scale = options.scale;
        let (width, height) = options.scaled_size();

        Self {
            width,
            height,
            title: TextLine {
                x: TEXT_LEFT * scale,
                baseline: TITLE_BASELINE * scale,
                font_size: TITLE_FONT_SIZE * scale,
            },
            subtitle: TextLine {
                x: TEXT_LEFT * scale,
                baseline: SUBTITLE_BASELINE * scale,
                font_size: SUBTITLE_FONT_SIZE * scale,
            },
        }
    }
}

/// Renders the watermark text into pixel buffers
pub struct Renderer {
    font_system: FontSystem,
    swash_cache: SwashCache,
    /// Family name of the custom font, if the font database has it
    custom_family: Option<String>,
}

impl Renderer {
    /// Create a renderer backed by the system font database
    pub fn new(options: &DrawOptions) -> Self {
        Self::with_font_system(FontSystem::new(), options)
    }

    pub fn with_font_system(font_system: FontSystem, options: &DrawOptions) -> Self {
        let custom_family = resolve_family(&font_system, &options.custom_font);
        Self {
            font_system,
            swash_cache: SwashCache::new(),
            custom_family,
        }
    }

    /// The custom family in use, or `None` for the built-in default
    pub fn custom_family(&self) -> Option<&str> {
        self.custom_family.as_deref()
    }

    /// Draw title and subtitle into `buffer` (RGBA, `width * height * 4`
    /// bytes). The buffer is cleared first, so repeated calls with the same
    /// options produce the same bytes.
    pub fn render(&mut self, options: &DrawOptions, buffer: &mut [u8], width: u32, height: u32) {
        let Some(mut pixmap) = PixmapMut::from_bytes(buffer, width, height) else {
            buffer.fill(0);
            return;
        };
        pixmap.fill(Color::TRANSPARENT);

        let layout = TextLayout::compute(options);
        let [r, g, b, a] = options.text_color.to_rgba8();
        let color = CosmicColor::rgba(r, g, b, a);

        self.draw_line(&mut pixmap, options, options.title_text(), layout.title, color);
        self.draw_line(&mut pixmap, options, options.subtitle_text(), layout.subtitle, color);
    }

    fn draw_line(
        &mut self,
        pixmap: &mut PixmapMut,
        options: &DrawOptions,
        text: &str,
        line: TextLine,
        color: CosmicColor,
    ) {
        if text.is_empty() || line.font_size <= 0.0 {
            return;
        }

        let metrics = Metrics::new(line.font_size, line.font_size * LINE_HEIGHT_FACTOR);
        let attrs = text_attrs(self.custom_family.as_deref(), options);
        let mut text_buffer = Buffer::new(&mut self.font_system, metrics);
        text_buffer.set_text(&mut self.font_system, text, &attrs, Shaping::Advanced, None);
        text_buffer.shape_until_scroll(&mut self.font_system, false);

        // Only the first layout line is drawn; there is no wrapping width
        let glyphs: Vec<_> = text_buffer
            .layout_runs()
            .take(1)
            .flat_map(|run| run.glyphs.iter().cloned())
            .collect();

        for glyph in &glyphs {
            let physical_glyph = glyph.physical((line.x, line.baseline), 1.0);

            let Some(image) = self
                .swash_cache
                .get_image(&mut self.font_system, physical_glyph.cache_key)
            else {
                continue;
            };
            if image.content != SwashContent::Mask {
                continue;
            }

            draw_glyph_to_pixmap(
                pixmap,
                &image.data,
                image.placement.width,
                image.placement.height,
                physical_glyph.x + image.placement.left,
                physical_glyph.y - image.placement.top,
                color,
            );
        }
    }
}

fn text_attrs<'a>(custom_family: Option<&'a str>, options: &DrawOptions) -> Attrs<'a> {
    let family = match custom_family {
        Some(name) => Family::Name(name),
        None => Family::SansSerif,
    };

    let mut attrs = Attrs::new().family(family);
    if options.bold_mode {
        attrs = attrs.weight(Weight::BOLD);
    }
    if options.slant_mode {
        attrs = attrs.style(Style::Italic);
    }
    attrs
}

/// Find a font family by case-insensitive name. Empty means "use the default".
fn resolve_family(font_system: &FontSystem, requested: &str) -> Option<String> {
    let requested = requested.trim();
    if requested.is_empty() {
        return None;
    }

    let found = font_system.db().faces().find_map(|face| {
        face.families
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(requested))
            .map(|(name, _)| name.clone())
    });

    if found.is_none() {
        debug!(font = requested, "Custom font not found, using default");
    }
    found
}

/// Draw a glyph coverage mask onto a pixmap with alpha blending
fn draw_glyph_to_pixmap(
    pixmap: &mut PixmapMut,
    glyph_data: &[u8],
    glyph_width: u32,
    glyph_height: u32,
    dest_x: i32,
    dest_y: i32,
    color: CosmicColor,
) {
    let pixmap_width = pixmap.width() as i32;
    let pixmap_height = pixmap.height() as i32;
    let data = pixmap.data_mut();

    for gy in 0..glyph_height as i32 {
        let py = dest_y + gy;
        if py < 0 || py >= pixmap_height {
            continue;
        }

        for gx in 0..glyph_width as i32 {
            let px = dest_x + gx;
            if px < 0 || px >= pixmap_width {
                continue;
            }

            let glyph_idx = (gy as u32 * glyph_width + gx as u32) as usize;
            let Some(&alpha) = glyph_data.get(glyph_idx) else {
                continue;
            };
            if alpha == 0 {
                continue;
            }

            let pixel_idx = ((py as u32 * pixmap_width as u32 + px as u32) * 4) as usize;
            if pixel_idx + 3 >= data.len() {
                continue;
            }

            let src_a = (alpha as u32 * color.a() as u32) / 255;
            let inv_a = 255 - src_a;

            data[pixel_idx] =
                ((color.r() as u32 * src_a + data[pixel_idx] as u32 * inv_a) / 255) as u8;
            data[pixel_idx + 1] =
                ((color.g() as u32 * src_a + data[pixel_idx + 1] as u32 * inv_a) / 255) as u8;
            data[pixel_idx + 2] =
                ((color.b() as u32 * src_a + data[pixel_idx + 2] as u32 * inv_a) / 255) as u8;
            data[pixel_idx + 3] = (src_a + (data[pixel_idx + 3] as u32 * inv_a) / 255) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use activate_types::Color as TextColor;

    fn activate_options() -> DrawOptions {
        DrawOptions {
            title: Some("ACTIVATE".to_string()),
            subtitle: Some("Go to Settings".to_string()),
            scale: 1.0,
            overlay_width: 340,
            overlay_height: 120,
            text_color: TextColor::new(0.82, 0.82, 0.82, 1.0),
            ..DrawOptions::default()
        }
    }

    fn render_once(renderer: &mut Renderer, options: &DrawOptions) -> Vec<u8> {
        let (width, height) = options.scaled_size();
        let mut buffer = vec![0xAB; (width * height * 4) as usize];
        renderer.render(options, &mut buffer, width, height);
        buffer
    }

    /// Renderer over the system fonts, or `None` on a machine without any
    fn renderer_with_fonts(options: &DrawOptions) -> Option<Renderer> {
        let renderer = Renderer::new(options);
        if renderer.font_system.db().faces().next().is_none() {
            eprintln!("no system fonts installed, skipping");
            return None;
        }
        Some(renderer)
    }

    /// Rows containing at least one non-transparent pixel
    fn painted_rows(buffer: &[u8], width: u32) -> Vec<u32> {
        buffer
            .chunks_exact(width as usize * 4)
            .enumerate()
            .filter(|(_, row)| row.chunks_exact(4).any(|px| px[3] != 0))
            .map(|(y, _)| y as u32)
            .collect()
    }

    fn painted_pixels(buffer: &[u8]) -> usize {
        buffer.chunks_exact(4).filter(|px| px[3] != 0).count()
    }

    #[test]
    fn test_layout_at_unit_scale() {
        let layout = TextLayout::compute(&activate_options());

        assert_eq!((layout.width, layout.height), (340, 120));
        assert_eq!(layout.title.x, 20.0);
        assert_eq!(layout.title.baseline, 30.0);
        assert_eq!(layout.title.font_size, 24.0);

        // Subtitle sits below the title, left-aligned with it
        assert_eq!(layout.subtitle.x, layout.title.x);
        assert!(layout.subtitle.baseline > layout.title.baseline);
        assert!(layout.subtitle.font_size < layout.title.font_size);
    }

    #[test]
    fn test_layout_scales_everything() {
        let options = DrawOptions {
            scale: 2.0,
            ..activate_options()
        };
        let layout = TextLayout::compute(&options);

        assert_eq!((layout.width, layout.height), (680, 240));
        assert_eq!(layout.title.x, 40.0);
        assert_eq!(layout.title.baseline, 60.0);
        assert_eq!(layout.subtitle.baseline, 110.0);
        assert_eq!(layout.subtitle.font_size, 32.0);
    }

    #[test]
    fn test_render_is_idempotent() {
        let options = activate_options();
        let mut renderer = Renderer::new(&options);

        let first = render_once(&mut renderer, &options);
        let second = render_once(&mut renderer, &options);
        assert_eq!(first, second);
        assert!(first.chunks_exact(4).all(|px| px != [0xAB; 4]), "buffer was cleared");

        // Redrawing over the previous frame gives the same bytes too
        let (width, height) = options.scaled_size();
        let mut reused = first.clone();
        renderer.render(&options, &mut reused, width, height);
        assert_eq!(reused, first);
    }

    #[test]
    fn test_render_draws_text() {
        let options = activate_options();
        let Some(mut renderer) = renderer_with_fonts(&options) else {
            return;
        };
        let buffer = render_once(&mut renderer, &options);
        assert!(painted_pixels(&buffer) > 0);
    }

    #[test]
    fn test_title_sits_above_subtitle() {
        for scale in [1.0, 2.0] {
            let base = DrawOptions {
                scale,
                ..activate_options()
            };
            let Some(mut renderer) = renderer_with_fonts(&base) else {
                return;
            };
            let (width, _) = base.scaled_size();

            let title_only = DrawOptions {
                subtitle: None,
                ..base.clone()
            };
            let subtitle_only = DrawOptions {
                title: None,
                ..base.clone()
            };
            let title_rows = painted_rows(&render_once(&mut renderer, &title_only), width);
            let subtitle_rows = painted_rows(&render_once(&mut renderer, &subtitle_only), width);
            assert!(!title_rows.is_empty() && !subtitle_rows.is_empty());

            // "ACTIVATE" has no descenders: it stays between the top of a
            // 24px em box and its baseline, give or take antialiasing
            let top = ((TITLE_BASELINE - TITLE_FONT_SIZE) * scale) as u32;
            let baseline = (TITLE_BASELINE * scale) as u32;
            let (first, last) = (title_rows[0], title_rows[title_rows.len() - 1]);
            assert!(first + 2 >= top, "title starts at row {first}, scale {scale}");
            assert!(last <= baseline + 2, "title ends at row {last}, scale {scale}");

            assert!(
                subtitle_rows[0] > last,
                "subtitle starts at row {}, title ends at {last}",
                subtitle_rows[0]
            );
        }
    }

    #[test]
    fn test_bold_changes_output() {
        let regular = activate_options();
        let Some(mut renderer) = renderer_with_fonts(&regular) else {
            return;
        };

        // Only meaningful when the default family ships a bold face
        let db = renderer.font_system.db();
        let family = db.family_name(&Family::SansSerif).to_string();
        let has_bold = db
            .faces()
            .any(|face| face.weight.0 >= 600 && face.families.iter().any(|(name, _)| *name == family));
        if !has_bold {
            eprintln!("no bold face for {family}, skipping");
            return;
        }

        let bold = DrawOptions {
            bold_mode: true,
            ..regular.clone()
        };
        let regular_buffer = render_once(&mut renderer, &regular);
        let bold_buffer = render_once(&mut renderer, &bold);
        assert!(painted_pixels(&bold_buffer) > 0);
        assert_ne!(regular_buffer, bold_buffer);
    }

    #[test]
    fn test_painted_pixels_use_text_color() {
        let options = activate_options();
        let Some(mut renderer) = renderer_with_fonts(&options) else {
            return;
        };
        let buffer = render_once(&mut renderer, &options);
        assert!(painted_pixels(&buffer) > 0);

        for pixel in buffer.chunks_exact(4) {
            let [r, g, b, a] = [pixel[0], pixel[1], pixel[2], pixel[3]];
            if a == 0 {
                assert_eq!([r, g, b], [0, 0, 0], "transparent pixels are fully cleared");
                continue;
            }
            // Premultiplied grey
            assert_eq!(r, g);
            assert_eq!(g, b);
            assert!(r <= a);
        }
    }

    #[test]
    fn test_missing_custom_font_falls_back() {
        let options = DrawOptions {
            custom_font: "No Such Font Family 1234".to_string(),
            ..activate_options()
        };
        let mut renderer = Renderer::new(&options);
        assert_eq!(renderer.custom_family(), None);

        // Still renders without failing
        let buffer = render_once(&mut renderer, &options);
        assert_eq!(buffer.len(), 340 * 120 * 4);
    }

    #[test]
    fn test_empty_custom_font_uses_default() {
        let renderer = Renderer::new(&activate_options());
        assert_eq!(renderer.custom_family(), None);
    }

    #[test]
    fn test_zero_scale_renders_nothing() {
        let options = DrawOptions {
            scale: 0.0,
            ..activate_options()
        };
        let mut renderer = Renderer::new(&options);
        let buffer = render_once(&mut renderer, &options);
        assert_eq!(buffer, vec![0u8; 4]);
    }

    #[test]
    fn test_mismatched_buffer_is_cleared() {
        let options = activate_options();
        let mut renderer = Renderer::new(&options);
        let mut buffer = vec![0xFF; 16];
        renderer.render(&options, &mut buffer, 340, 120);
        assert!(buffer.iter().all(|&b| b == 0));
    }
}
