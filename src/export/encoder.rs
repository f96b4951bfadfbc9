//! Chart encoders
//!
//! Provides a trait-based encoder system that turns a composited chart
//! surface into the bytes of one export format:
//! - JPG: lossy, quality honored
//! - PNG: lossless RGBA
//! - SVG: raster embedded as a base64 PNG data URI
//! - HTML: self-contained page with the chart embedded
//! - PDF: single page with the JPEG embedded via DCTDecode (printpdf)

use crate::capability::ExportFormat;
use crate::error::ChartyError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::RgbaImage;
use std::io::Cursor;

/// Quality settings for chart encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderQuality {
    /// Quality value (1-100, where 100 is best quality)
    pub quality: u8,
}

impl Default for EncoderQuality {
    fn default() -> Self {
        Self { quality: 90 }
    }
}

impl EncoderQuality {
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    /// Map an export quality in `0.0..=1.0` to the encoder scale.
    pub fn from_export_quality(quality: f32) -> Self {
        Self::with_quality((quality.clamp(0.0, 1.0) * 100.0).round() as u8)
    }
}

/// Per-call encoding inputs besides the pixels.
#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    pub quality: EncoderQuality,
    /// Chart title, used by document formats
    pub title: Option<String>,
}

/// Result of encoding a chart
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub format: ExportFormat,
    /// MIME type of `data`
    pub content_type: &'static str,
}

impl EncodedImage {
    pub fn new(data: Vec<u8>, format: ExportFormat) -> Self {
        Self {
            data,
            format,
            content_type: format.content_type(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Trait for chart encoders
///
/// Object-safe so the pipeline can pick an encoder per call.
pub trait ImageEncoder: Send + Sync {
    fn format(&self) -> ExportFormat;

    fn encode(
        &self,
        surface: &RgbaImage,
        options: &EncodeOptions,
    ) -> Result<EncodedImage, ChartyError>;

    fn supports_transparency(&self) -> bool;
}

/// JPEG encoder using the image crate
pub struct JpegEncoder;

impl ImageEncoder for JpegEncoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::Jpg
    }

    fn encode(
        &self,
        surface: &RgbaImage,
        options: &EncodeOptions,
    ) -> Result<EncodedImage, ChartyError> {
        let data = encode_jpeg(surface, options.quality)?;
        Ok(EncodedImage::new(data, ExportFormat::Jpg))
    }

    fn supports_transparency(&self) -> bool {
        false
    }
}

/// PNG encoder using the image crate
pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::Png
    }

    fn encode(
        &self,
        surface: &RgbaImage,
        _options: &EncodeOptions,
    ) -> Result<EncodedImage, ChartyError> {
        let data = encode_png(surface, ExportFormat::Png)?;
        Ok(EncodedImage::new(data, ExportFormat::Png))
    }

    fn supports_transparency(&self) -> bool {
        true
    }
}

/// SVG wrapper around an embedded PNG.
pub struct SvgEncoder;

impl ImageEncoder for SvgEncoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::Svg
    }

    fn encode(
        &self,
        surface: &RgbaImage,
        options: &EncodeOptions,
    ) -> Result<EncodedImage, ChartyError> {
        let png = encode_png(surface, ExportFormat::Svg)?;
        let (w, h) = surface.dimensions();
        let title = options
            .title
            .as_deref()
            .map(|t| format!("<title>{}</title>", escape_markup(t)))
            .unwrap_or_default();

        let svg = format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                "\n",
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
                "{title}",
                r#"<image width="{w}" height="{h}" href="data:image/png;base64,{data}"/>"#,
                "</svg>\n"
            ),
            w = w,
            h = h,
            title = title,
            data = BASE64.encode(png),
        );

        Ok(EncodedImage::new(svg.into_bytes(), ExportFormat::Svg))
    }

    fn supports_transparency(&self) -> bool {
        true
    }
}

/// Self-contained HTML page embedding the chart.
pub struct HtmlEncoder;

impl ImageEncoder for HtmlEncoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::Html
    }

    fn encode(
        &self,
        surface: &RgbaImage,
        options: &EncodeOptions,
    ) -> Result<EncodedImage, ChartyError> {
        let png = encode_png(surface, ExportFormat::Html)?;
        let (w, h) = surface.dimensions();
        let title = escape_markup(options.title.as_deref().unwrap_or("Chart"));

        let html = format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>body{{margin:0;background:#000;display:flex;justify-content:center;align-items:center;min-height:100vh}}img{{max-width:100%;height:auto}}</style>
</head>
<body>
<img src="data:image/png;base64,{data}" width="{w}" height="{h}" alt="{title}">
</body>
</html>
"#,
            title = title,
            data = BASE64.encode(png),
            w = w,
            h = h,
        );

        Ok(EncodedImage::new(html.into_bytes(), ExportFormat::Html))
    }

    fn supports_transparency(&self) -> bool {
        true
    }
}

/// Single-page PDF with the chart as a JPEG image.
pub struct PdfEncoder;

impl ImageEncoder for PdfEncoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn encode(
        &self,
        surface: &RgbaImage,
        options: &EncodeOptions,
    ) -> Result<EncodedImage, ChartyError> {
        let jpeg = encode_jpeg(surface, options.quality)?;
        let (w, h) = surface.dimensions();
        let data = write_pdf(jpeg, w, h, options.title.as_deref().unwrap_or("Chart"))
            .map_err(|e| ChartyError::encode_failed("pdf", e.to_string()))?;
        Ok(EncodedImage::new(data, ExportFormat::Pdf))
    }

    fn supports_transparency(&self) -> bool {
        false
    }
}

/// Factory for creating encoders based on export format
pub struct EncoderFactory;

impl EncoderFactory {
    pub fn create(format: ExportFormat) -> Box<dyn ImageEncoder> {
        match format {
            ExportFormat::Jpg => Box::new(JpegEncoder),
            ExportFormat::Png => Box::new(PngEncoder),
            ExportFormat::Svg => Box::new(SvgEncoder),
            ExportFormat::Html => Box::new(HtmlEncoder),
            ExportFormat::Pdf => Box::new(PdfEncoder),
        }
    }
}

fn encode_jpeg(surface: &RgbaImage, quality: EncoderQuality) -> Result<Vec<u8>, ChartyError> {
    use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
    use image::ImageEncoder as _;

    // JPEG has no alpha channel
    let rgb_data = rgba_to_rgb(surface.as_raw());

    let mut output = Cursor::new(Vec::new());
    ImageJpegEncoder::new_with_quality(&mut output, quality.quality)
        .write_image(
            &rgb_data,
            surface.width(),
            surface.height(),
            image::ColorType::Rgb8,
        )
        .map_err(|e| ChartyError::encode_failed("jpg", e.to_string()))?;

    Ok(output.into_inner())
}

fn encode_png(surface: &RgbaImage, target: ExportFormat) -> Result<Vec<u8>, ChartyError> {
    use image::codecs::png::PngEncoder as ImagePngEncoder;
    use image::ImageEncoder as _;

    let mut output = Cursor::new(Vec::new());
    ImagePngEncoder::new(&mut output)
        .write_image(
            surface.as_raw(),
            surface.width(),
            surface.height(),
            image::ColorType::Rgba8,
        )
        .map_err(|e| ChartyError::encode_failed(target.as_str(), e.to_string()))?;

    Ok(output.into_inner())
}

/// Convert RGBA to RGB by discarding alpha channel
fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for chunk in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&chunk[..3]);
    }
    rgb
}

fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Page resolution: one surface pixel per PDF point.
const PDF_DPI: f32 = 72.0;

/// One-page document sized to the surface, with the JPEG as its only image.
fn write_pdf(
    jpeg: Vec<u8>,
    width: u32,
    height: u32,
    title: &str,
) -> Result<Vec<u8>, printpdf::Error> {
    use printpdf::{
        ColorBits, ColorSpace, Image, ImageFilter, ImageTransform, ImageXObject, Mm, PdfDocument,
        Px,
    };

    let px_to_mm = 25.4 / PDF_DPI;
    let (doc, page, layer) = PdfDocument::new(
        title,
        Mm(width as f32 * px_to_mm),
        Mm(height as f32 * px_to_mm),
        "Chart",
    );

    let image = Image::from(ImageXObject {
        width: Px(width as usize),
        height: Px(height as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: jpeg,
        image_filter: Some(ImageFilter::DCT),
        smask: None,
        clipping_bbox: None,
    });
    image.add_to_layer(
        doc.get_page(page).get_layer(layer),
        ImageTransform {
            dpi: Some(PDF_DPI),
            ..Default::default()
        },
    );

    doc.save_to_bytes()
}
