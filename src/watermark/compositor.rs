//! Watermark compositor.
//!
//! Owns the live [`WatermarkConfig`] and draws it in two places:
//!
//! - onto captured raster surfaces during export ([`WatermarkCompositor::composite`])
//! - onto the live overlay element, restyled after every config mutation
//!
//! Compositing reads the config and an optional per-call override; it never
//! writes either. Drawing state (shadow, alpha) lives in per-call locals.
//!
//! # Example
//!
//! ```ignore
//! use charty::watermark::{WatermarkCompositor, WatermarkConfig};
//! use image::{Rgba, RgbaImage};
//!
//! let compositor = WatermarkCompositor::new(WatermarkConfig::default());
//! let mut surface = RgbaImage::from_pixel(800, 600, Rgba([0, 0, 0, 255]));
//! compositor.composite(&mut surface, None)?;
//! ```

use super::overlay::{LiveOverlay, OverlayHost, OverlayStyle, OVERLAY_ELEMENT_ID};
use super::position::{
    effective_style, place, resolve_anchor, ImageDimensions, PlacementPosition,
    WatermarkDimensions,
};
use super::text_renderer::{default_font, render_text, Color, GlyphFont, TextRenderOptions};
use super::{
    FontWeight, WatermarkConfig, WatermarkError, WatermarkOverride, WatermarkPosition,
    WatermarkSettings,
};
use crate::constants::{
    MAX_WATERMARK_SIZE, RASTER_WATERMARK_PADDING, WATERMARK_SHADOW_ALPHA, WATERMARK_SHADOW_BLUR,
    WATERMARK_SHADOW_OFFSET,
};
use image::{imageops, Rgba, RgbaImage};
use std::sync::Arc;

/// Extra transparent border around the shadow mask so the blur can spread.
const SHADOW_MARGIN: u32 = 3;

/// Compositor for the session's watermark.
pub struct WatermarkCompositor {
    config: WatermarkConfig,
    font: Arc<GlyphFont>,
    padding: u32,
    overlay: Option<LiveOverlay>,
}

impl std::fmt::Debug for WatermarkCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkCompositor")
            .field("config", &self.config)
            .field("font", &self.font)
            .field("padding", &self.padding)
            .field("overlay", &self.overlay)
            .finish()
    }
}

impl Default for WatermarkCompositor {
    fn default() -> Self {
        Self::new(WatermarkConfig::default())
    }
}

impl WatermarkCompositor {
    /// Create a compositor using the process-wide default font.
    pub fn new(config: WatermarkConfig) -> Self {
        Self::with_font(config, default_font())
    }

    pub fn with_font(config: WatermarkConfig, font: Arc<GlyphFont>) -> Self {
        Self {
            config,
            font,
            padding: RASTER_WATERMARK_PADDING,
            overlay: None,
        }
    }

    pub fn config(&self) -> &WatermarkConfig {
        &self.config
    }

    pub fn font(&self) -> &Arc<GlyphFont> {
        &self.font
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
        self.refresh_overlay();
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.config.text = text.into();
        self.refresh_overlay();
    }

    /// Set opacity, clamped to `0.0..=1.0`.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.config.opacity = if opacity.is_finite() {
            opacity.clamp(0.0, 1.0)
        } else {
            self.config.opacity
        };
        self.refresh_overlay();
    }

    pub fn set_size(&mut self, size: f32) {
        if size.is_finite() && size > 0.0 && size <= MAX_WATERMARK_SIZE {
            self.config.size = size;
            self.refresh_overlay();
        }
    }

    pub fn set_position(&mut self, position: WatermarkPosition) {
        self.config.position = position;
        self.refresh_overlay();
    }

    pub fn set_color(&mut self, color: Color) {
        self.config.color = color;
        self.refresh_overlay();
    }

    /// Apply partial settings in one step.
    ///
    /// The merged config is validated before it replaces the live one, so a
    /// rejected update leaves the previous config in place.
    pub fn apply_settings(&mut self, settings: &WatermarkSettings) -> Result<(), WatermarkError> {
        let mut next = self.config.clone();
        if let Some(enabled) = settings.enabled {
            next.enabled = enabled;
        }
        if let Some(text) = &settings.text {
            next.text = text.clone();
        }
        if let Some(opacity) = settings.opacity {
            next.opacity = opacity;
        }
        if let Some(size) = settings.size {
            next.size = size;
        }
        if let Some(position) = settings.position {
            next.position = position;
        }
        if let Some(color) = settings.color {
            next.color = color;
        }
        if let Some(font) = &settings.font {
            next.font = font.clone();
        }
        next.validate()?;

        self.config = next;
        tracing::debug!(
            enabled = self.config.enabled,
            opacity = self.config.opacity,
            size = self.config.size,
            position = %self.config.position,
            "Watermark settings applied"
        );
        self.refresh_overlay();
        Ok(())
    }

    /// Mount the live overlay on a host, replacing any previous one.
    pub fn attach_overlay(&mut self, host: Arc<dyn OverlayHost>) -> Result<(), WatermarkError> {
        self.detach_overlay();

        host.mount(OVERLAY_ELEMENT_ID)?;
        let style = OverlayStyle::from_config(&self.config);
        if let Err(e) = host.apply(&style) {
            host.unmount();
            return Err(e);
        }
        self.overlay = Some(LiveOverlay { host, style });
        Ok(())
    }

    pub fn detach_overlay(&mut self) {
        if let Some(overlay) = self.overlay.take() {
            overlay.host.unmount();
        }
    }

    /// Style last pushed to the live overlay, if one is mounted.
    pub fn overlay_style(&self) -> Option<&OverlayStyle> {
        self.overlay.as_ref().map(|o| &o.style)
    }

    fn refresh_overlay(&mut self) {
        let Some(overlay) = self.overlay.as_mut() else {
            return;
        };
        let style = OverlayStyle::from_config(&self.config);
        match overlay.host.apply(&style) {
            Ok(()) => overlay.style = style,
            Err(e) => tracing::warn!(error = %e, "Failed to restyle watermark overlay"),
        }
    }

    /// Draw the watermark onto `surface`.
    ///
    /// The effective config is the live config merged with `overrides`.
    /// Returns `Ok(false)` without touching the surface when the effective
    /// config is disabled, `Ok(true)` after drawing.
    pub fn composite(
        &self,
        surface: &mut RgbaImage,
        overrides: Option<&WatermarkOverride>,
    ) -> Result<bool, WatermarkError> {
        let effective = match overrides {
            Some(o) => self.config.merged(o),
            None => self.config.clone(),
        };

        if !effective.enabled {
            return Ok(false);
        }
        effective.validate()?;

        if surface.width() == 0 || surface.height() == 0 {
            return Err(WatermarkError::CompositeError(
                "surface has no pixels".to_string(),
            ));
        }

        let (font_size, opacity) =
            effective_style(effective.position, effective.size, effective.opacity);
        let text = render_text(
            &self.font,
            &TextRenderOptions {
                text: effective.text.clone(),
                font_size,
                color: effective.color,
                opacity,
                bold: effective.font.weight == FontWeight::Bold,
            },
        )?;

        let surface_dims = ImageDimensions {
            width: surface.width(),
            height: surface.height(),
        };
        let anchor = resolve_anchor(effective.position, &surface_dims, effective.size, self.padding);
        let origin = place(
            &anchor,
            &WatermarkDimensions {
                width: text.width(),
                height: text.height(),
            },
        );

        let shadow = shadow_layer(&text);
        let shadow_origin = PlacementPosition::new(
            origin.x + WATERMARK_SHADOW_OFFSET - SHADOW_MARGIN as i32,
            origin.y + WATERMARK_SHADOW_OFFSET - SHADOW_MARGIN as i32,
        );
        blend_layer(surface, &shadow, shadow_origin);
        blend_layer(surface, &text, origin);

        Ok(true)
    }
}

/// Build the blurred drop shadow for a rendered text layer.
///
/// The shadow takes the text's coverage in black, scaled by the shadow alpha.
fn shadow_layer(text: &RgbaImage) -> RgbaImage {
    let mut mask = RgbaImage::new(
        text.width() + SHADOW_MARGIN * 2,
        text.height() + SHADOW_MARGIN * 2,
    );
    for (x, y, pixel) in text.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        let alpha = (pixel[3] as f32 * WATERMARK_SHADOW_ALPHA).round() as u8;
        mask.put_pixel(x + SHADOW_MARGIN, y + SHADOW_MARGIN, Rgba([0, 0, 0, alpha]));
    }
    // Canvas shadow blur is roughly twice the gaussian sigma
    imageops::blur(&mask, WATERMARK_SHADOW_BLUR / 2.0)
}

/// Blend a layer onto the target image at `origin`, clipped to the target.
fn blend_layer(target: &mut RgbaImage, layer: &RgbaImage, origin: PlacementPosition) {
    let target_width = target.width() as i32;
    let target_height = target.height() as i32;

    let x_start = origin.x.max(0);
    let y_start = origin.y.max(0);
    let x_end = (origin.x + layer.width() as i32).min(target_width);
    let y_end = (origin.y + layer.height() as i32).min(target_height);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let fg = *layer.get_pixel((tx - origin.x) as u32, (ty - origin.y) as u32);
            if fg[3] == 0 {
                continue;
            }
            let bg = *target.get_pixel(tx as u32, ty as u32);
            target.put_pixel(tx as u32, ty as u32, blend_pixels(bg, fg));
        }
    }
}

/// Porter-Duff "over": result = foreground + background * (1 - foreground.alpha)
fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
