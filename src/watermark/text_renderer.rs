//! Text watermark rendering.
//!
//! This module renders watermark text to RGBA images that can be composited
//! onto captured chart surfaces.
//!
//! # Features
//!
//! - Color parsing (`#RGB`, `#RRGGBB`, `rgb(...)`, `rgba(...)`)
//! - Configurable font size, opacity and weight
//! - Outline fonts loaded from a configured or system path (`ab_glyph`)
//! - Built-in 8x8 bitmap font when no outline font is available
//!
//! # Example
//!
//! ```ignore
//! use charty::watermark::text_renderer::{default_font, render_text, Color, TextRenderOptions};
//!
//! let options = TextRenderOptions {
//!     text: "GetCharty.com".to_string(),
//!     font_size: 14.0,
//!     color: Color::white(),
//!     opacity: 0.4,
//!     bold: true,
//! };
//!
//! let image = render_text(&default_font(), &options).unwrap();
//! ```

use super::WatermarkError;
use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use font8x8::UnicodeFonts;
use image::{Rgba, RgbaImage};
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Well-known outline font locations probed when no font path is configured.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Width and height of a glyph in the built-in bitmap font.
const BITMAP_CELL: f32 = 8.0;

static DEFAULT_FONT: OnceLock<Arc<GlyphFont>> = OnceLock::new();

/// Glyph source used to rasterize watermark text.
pub enum GlyphFont {
    /// Scalable outline font
    Outline(FontVec),
    /// Built-in 8x8 bitmap font, scaled with nearest-neighbour sampling
    Bitmap,
}

impl std::fmt::Debug for GlyphFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Outline(_) => f.write_str("GlyphFont::Outline"),
            Self::Bitmap => f.write_str("GlyphFont::Bitmap"),
        }
    }
}

impl GlyphFont {
    /// Load an outline font from a TTF/OTF file.
    pub fn from_file(path: &Path) -> Result<Self, WatermarkError> {
        let data = std::fs::read(path).map_err(|e| {
            WatermarkError::RenderError(format!("cannot read font {}: {}", path.display(), e))
        })?;
        let font = FontVec::try_from_vec(data).map_err(|e| {
            WatermarkError::RenderError(format!("invalid font {}: {}", path.display(), e))
        })?;
        Ok(Self::Outline(font))
    }

    /// Resolve a font: the configured path first, then well-known system
    /// fonts, then the built-in bitmap font. Never fails.
    pub fn resolve(configured: Option<&Path>) -> Self {
        if let Some(path) = configured {
            match Self::from_file(path) {
                Ok(font) => return font,
                Err(e) => tracing::warn!(error = %e, "Configured watermark font unusable"),
            }
        }

        for candidate in SYSTEM_FONT_CANDIDATES {
            let path = Path::new(candidate);
            if path.exists() {
                if let Ok(font) = Self::from_file(path) {
                    tracing::debug!(font = %candidate, "Using system font for watermarks");
                    return font;
                }
            }
        }

        tracing::debug!("No outline font found, using built-in bitmap font for watermarks");
        Self::Bitmap
    }

    pub fn is_bitmap(&self) -> bool {
        matches!(self, Self::Bitmap)
    }
}

/// Get the process-wide default font, resolving it lazily.
pub fn default_font() -> Arc<GlyphFont> {
    DEFAULT_FONT
        .get_or_init(|| Arc::new(GlyphFont::resolve(None)))
        .clone()
}

/// Parsed RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// White color.
    pub fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// Black color.
    pub fn black() -> Self {
        Self::new(0, 0, 0)
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    pub fn alpha_f32(&self) -> f32 {
        self.a as f32 / 255.0
    }

    /// CSS `rgba(...)` notation.
    pub fn to_css(&self) -> String {
        let alpha = (self.alpha_f32() * 100.0).round() / 100.0;
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
    }

    pub fn to_rgba(&self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }
}

/// Options for text rendering.
#[derive(Debug, Clone)]
pub struct TextRenderOptions {
    /// The text to render.
    pub text: String,
    /// Font size in pixels.
    pub font_size: f32,
    /// Text color. Its alpha is multiplied with `opacity`.
    pub color: Color,
    /// Opacity (0.0 to 1.0).
    pub opacity: f32,
    /// Thicken strokes by one pixel.
    pub bold: bool,
}

impl Default for TextRenderOptions {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: 14.0,
            color: Color::white(),
            opacity: 0.4,
            bold: false,
        }
    }
}

/// Measured extent of rendered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextMetrics {
    pub width: u32,
    pub height: u32,
    /// Distance from the top of the box to the baseline
    pub ascent: u32,
}

/// Parse a hex color string into RGB components.
///
/// Supports both #RGB and #RRGGBB formats.
///
/// # Examples
///
/// ```ignore
/// let white = parse_hex_color("#FFF").unwrap();
/// assert_eq!(white, Color::new(255, 255, 255));
/// ```
pub fn parse_hex_color(hex: &str) -> Result<Color, WatermarkError> {
    let hex = hex
        .strip_prefix('#')
        .ok_or_else(|| WatermarkError::ConfigError("Color must start with '#'".to_string()))?;

    let digit = |s: &str| {
        u8::from_str_radix(s, 16)
            .map_err(|_| WatermarkError::ConfigError(format!("Invalid hex digit in '{}'", s)))
    };

    match hex.len() {
        3 => {
            // #RGB format - each digit doubled: 0xF -> 0xFF
            let r = digit(&hex[0..1])?;
            let g = digit(&hex[1..2])?;
            let b = digit(&hex[2..3])?;
            Ok(Color::new(r * 17, g * 17, b * 17))
        }
        6 => Ok(Color::new(
            digit(&hex[0..2])?,
            digit(&hex[2..4])?,
            digit(&hex[4..6])?,
        )),
        _ => Err(WatermarkError::ConfigError(format!(
            "Color must be #RGB or #RRGGBB format, got {} characters",
            hex.len()
        ))),
    }
}

/// Parse any supported color notation.
pub fn parse_color(value: &str) -> Result<Color, WatermarkError> {
    let value = value.trim();
    if value.starts_with('#') {
        return parse_hex_color(value);
    }

    let lower = value.to_ascii_lowercase();
    let (inner, has_alpha) = if let Some(rest) = lower.strip_prefix("rgba(") {
        (rest, true)
    } else if let Some(rest) = lower.strip_prefix("rgb(") {
        (rest, false)
    } else {
        return Err(WatermarkError::ConfigError(format!(
            "Unsupported color notation '{}'",
            value
        )));
    };

    let inner = inner
        .strip_suffix(')')
        .ok_or_else(|| WatermarkError::ConfigError(format!("Unclosed color '{}'", value)))?;
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    let expected = if has_alpha { 4 } else { 3 };
    if parts.len() != expected {
        return Err(WatermarkError::ConfigError(format!(
            "Color '{}' must have {} components",
            value, expected
        )));
    }

    let channel = |s: &str| {
        s.parse::<u8>()
            .map_err(|_| WatermarkError::ConfigError(format!("Invalid color channel '{}'", s)))
    };
    let color = Color::new(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?);

    if has_alpha {
        let alpha: f32 = parts[3]
            .parse()
            .map_err(|_| WatermarkError::ConfigError(format!("Invalid alpha '{}'", parts[3])))?;
        if !alpha.is_finite() || !(0.0..=1.0).contains(&alpha) {
            return Err(WatermarkError::ConfigError(format!(
                "Alpha must be between 0.0 and 1.0, got {}",
                alpha
            )));
        }
        Ok(color.with_alpha(alpha))
    } else {
        Ok(color)
    }
}

/// Calculate the dimensions of rendered text.
pub fn measure_text(
    font: &GlyphFont,
    text: &str,
    font_size: f32,
    bold: bool,
) -> Result<TextMetrics, WatermarkError> {
    if !font_size.is_finite() || font_size <= 0.0 {
        return Err(WatermarkError::RenderError(format!(
            "Font size must be positive, got {}",
            font_size
        )));
    }

    let extra = if bold { 1 } else { 0 };
    let metrics = match font {
        GlyphFont::Outline(font) => {
            let scaled_font = font.as_scaled(PxScale::from(font_size));

            let mut width = 0.0f32;
            let mut prev_glyph: Option<ab_glyph::GlyphId> = None;
            for c in text.chars() {
                let glyph_id = scaled_font.glyph_id(c);
                if let Some(prev) = prev_glyph {
                    width += scaled_font.kern(prev, glyph_id);
                }
                width += scaled_font.h_advance(glyph_id);
                prev_glyph = Some(glyph_id);
            }

            TextMetrics {
                width: width.ceil().max(1.0) as u32 + extra,
                height: scaled_font.height().ceil().max(1.0) as u32,
                ascent: scaled_font.ascent().ceil().max(0.0) as u32,
            }
        }
        GlyphFont::Bitmap => {
            let cell = bitmap_cell(font_size);
            TextMetrics {
                width: (cell * text.chars().count() as u32).max(1) + extra,
                height: cell,
                ascent: cell,
            }
        }
    };

    Ok(metrics)
}

/// Render text to an RGBA image.
///
/// Creates a new image with transparent background containing the rendered
/// text, sized to [`measure_text`].
pub fn render_text(
    font: &GlyphFont,
    options: &TextRenderOptions,
) -> Result<RgbaImage, WatermarkError> {
    if options.text.is_empty() {
        return Err(WatermarkError::RenderError(
            "Cannot render empty text".to_string(),
        ));
    }

    let metrics = measure_text(font, &options.text, options.font_size, false)?;
    let mut coverage = vec![0.0f32; metrics.width as usize * metrics.height as usize];

    match font {
        GlyphFont::Outline(font) => {
            rasterize_outline(font, options, &metrics, &mut coverage);
        }
        GlyphFont::Bitmap => {
            rasterize_bitmap(options, &metrics, &mut coverage);
        }
    }

    let (width, coverage) = if options.bold {
        embolden(&coverage, metrics.width, metrics.height)
    } else {
        (metrics.width, coverage)
    };

    let alpha = options.color.alpha_f32() * options.opacity.clamp(0.0, 1.0);
    let mut image = RgbaImage::new(width, metrics.height);
    for (i, value) in coverage.iter().enumerate() {
        if *value <= 0.0 {
            continue;
        }
        let x = i as u32 % width;
        let y = i as u32 / width;
        let pixel_alpha = (value.min(1.0) * alpha * 255.0).round() as u8;
        image.put_pixel(
            x,
            y,
            Rgba([options.color.r, options.color.g, options.color.b, pixel_alpha]),
        );
    }

    Ok(image)
}

fn bitmap_cell(font_size: f32) -> u32 {
    font_size.round().max(1.0) as u32
}

fn rasterize_outline(
    font: &FontVec,
    options: &TextRenderOptions,
    metrics: &TextMetrics,
    coverage: &mut [f32],
) {
    let scale = PxScale::from(options.font_size);
    let scaled_font = font.as_scaled(scale);
    let baseline_y = scaled_font.ascent();

    let mut cursor_x = 0.0f32;
    let mut prev_glyph: Option<ab_glyph::GlyphId> = None;

    for c in options.text.chars() {
        let glyph_id = scaled_font.glyph_id(c);
        if let Some(prev) = prev_glyph {
            cursor_x += scaled_font.kern(prev, glyph_id);
        }

        let glyph = glyph_id.with_scale_and_position(scale, ab_glyph::point(cursor_x, baseline_y));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, value| {
                let x = px as i32 + bounds.min.x as i32;
                let y = py as i32 + bounds.min.y as i32;
                if x >= 0 && y >= 0 && (x as u32) < metrics.width && (y as u32) < metrics.height {
                    let idx = (y as u32 * metrics.width + x as u32) as usize;
                    coverage[idx] = coverage[idx].max(value);
                }
            });
        }

        cursor_x += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }
}

fn rasterize_bitmap(options: &TextRenderOptions, metrics: &TextMetrics, coverage: &mut [f32]) {
    let cell = bitmap_cell(options.font_size);
    let factor = cell as f32 / BITMAP_CELL;

    for (index, c) in options.text.chars().enumerate() {
        let rows = font8x8::BASIC_FONTS
            .get(c)
            .or_else(|| font8x8::BASIC_FONTS.get('?'))
            .unwrap_or([0; 8]);
        let origin_x = index as u32 * cell;

        for py in 0..cell {
            let gy = ((py as f32 / factor) as usize).min(7);
            let row = rows[gy];
            for px in 0..cell {
                let gx = ((px as f32 / factor) as usize).min(7);
                // bit 0 is the leftmost pixel of the row
                if row & (1 << gx) != 0 {
                    let x = origin_x + px;
                    if x < metrics.width && py < metrics.height {
                        coverage[(py * metrics.width + x) as usize] = 1.0;
                    }
                }
            }
        }
    }
}

/// Thicken strokes by OR-ing the mask with itself shifted one pixel right.
fn embolden(coverage: &[f32], width: u32, height: u32) -> (u32, Vec<f32>) {
    let new_width = width + 1;
    let mut out = vec![0.0f32; (new_width * height) as usize];
    for y in 0..height {
        for x in 0..width {
            let value = coverage[(y * width + x) as usize];
            if value <= 0.0 {
                continue;
            }
            for dx in 0..2 {
                let idx = (y * new_width + x + dx) as usize;
                out[idx] = out[idx].max(value);
            }
        }
    }
    (new_width, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color_rrggbb() {
        assert_eq!(parse_hex_color("#FF0000").unwrap(), Color::new(255, 0, 0));
        assert_eq!(parse_hex_color("#00FF00").unwrap(), Color::new(0, 255, 0));
        assert_eq!(parse_hex_color("#0000FF").unwrap(), Color::new(0, 0, 255));
        assert_eq!(parse_hex_color("#000000").unwrap(), Color::black());
    }

    #[test]
    fn test_parse_hex_color_rgb() {
        assert_eq!(parse_hex_color("#FFF").unwrap(), Color::white());
        // A=10*17=170, B=11*17=187, C=12*17=204
        assert_eq!(parse_hex_color("#abc").unwrap(), Color::new(170, 187, 204));
    }

    #[test]
    fn test_parse_hex_color_invalid() {
        assert!(parse_hex_color("FF0000").is_err());
        assert!(parse_hex_color("#FF00").is_err());
        assert!(parse_hex_color("#GGGGGG").is_err());
    }

    #[test]
    fn test_parse_rgba_color() {
        let color = parse_color("rgba(255, 255, 255, 0.4)").unwrap();
        assert_eq!((color.r, color.g, color.b), (255, 255, 255));
        assert_eq!(color.a, 102);

        let color = parse_color("rgb(10,20,30)").unwrap();
        assert_eq!(color, Color::new(10, 20, 30));

        assert!(parse_color("rgba(255, 255, 255)").is_err());
        assert!(parse_color("rgba(255, 255, 255, 2.0)").is_err());
        assert!(parse_color("hsl(0, 0%, 0%)").is_err());
    }

    #[test]
    fn test_color_to_css() {
        assert_eq!(Color::white().with_alpha(0.4).to_css(), "rgba(255, 255, 255, 0.4)");
        assert_eq!(Color::black().to_css(), "rgba(0, 0, 0, 1)");
    }

    #[test]
    fn test_bitmap_font_renders_visible_pixels() {
        let options = TextRenderOptions {
            text: "Hello".to_string(),
            font_size: 16.0,
            opacity: 1.0,
            ..Default::default()
        };

        let image = render_text(&GlyphFont::Bitmap, &options).unwrap();
        assert_eq!(image.width(), 16 * 5);
        assert_eq!(image.height(), 16);
        assert!(image.pixels().any(|p| p[3] > 0));
    }

    #[test]
    fn test_render_text_opacity_affects_alpha() {
        let full = TextRenderOptions {
            text: "Test".to_string(),
            opacity: 1.0,
            ..Default::default()
        };
        let half = TextRenderOptions {
            opacity: 0.5,
            ..full.clone()
        };

        let font = default_font();
        let max_full = render_text(&font, &full).unwrap().pixels().map(|p| p[3]).max();
        let max_half = render_text(&font, &half).unwrap().pixels().map(|p| p[3]).max();
        assert!(max_half < max_full);
    }

    #[test]
    fn test_font_size_affects_dimensions() {
        let font = default_font();
        let small = measure_text(&font, "Hello", 12.0, false).unwrap();
        let large = measure_text(&font, "Hello", 24.0, false).unwrap();
        assert!(large.width > small.width);
        assert!(large.height > small.height);
    }

    #[test]
    fn test_bold_widens_text() {
        let regular = TextRenderOptions {
            text: "Bold".to_string(),
            ..Default::default()
        };
        let bold = TextRenderOptions {
            bold: true,
            ..regular.clone()
        };
        let font = GlyphFont::Bitmap;
        let regular_img = render_text(&font, &regular).unwrap();
        let bold_img = render_text(&font, &bold).unwrap();
        assert_eq!(bold_img.width(), regular_img.width() + 1);
        let count = |img: &RgbaImage| img.pixels().filter(|p| p[3] > 0).count();
        assert!(count(&bold_img) > count(&regular_img));
    }

    #[test]
    fn test_render_empty_text_error() {
        let options = TextRenderOptions::default();
        assert!(render_text(&GlyphFont::Bitmap, &options).is_err());
    }

    #[test]
    fn test_invalid_font_size_error() {
        assert!(measure_text(&GlyphFont::Bitmap, "x", 0.0, false).is_err());
        assert!(measure_text(&GlyphFont::Bitmap, "x", f32::NAN, false).is_err());
    }

    #[test]
    fn test_missing_font_file_falls_back() {
        let font = GlyphFont::resolve(Some(Path::new("/definitely/not/a/font.ttf")));
        // Either a system font or the bitmap font; rendering must work regardless.
        let options = TextRenderOptions {
            text: "ok".to_string(),
            ..Default::default()
        };
        assert!(render_text(&font, &options).is_ok());
    }
}
