//! Live on-screen watermark overlay.
//!
//! The overlay is an element the presentation layer keeps inside the chart
//! display region. The compositor derives an [`OverlayStyle`] from the live
//! [`WatermarkConfig`] and pushes it to the [`OverlayHost`] on every config
//! mutation.

use super::{WatermarkConfig, WatermarkError, WatermarkPosition};
use crate::constants::{
    CENTER_WATERMARK_OPACITY, CENTER_WATERMARK_SIZE_FACTOR, OVERLAY_WATERMARK_INSET_PX,
};
use serde::Serialize;

/// Element id of the overlay inside the chart container.
pub const OVERLAY_ELEMENT_ID: &str = "chart-watermark";

const OVERLAY_TEXT_SHADOW: &str = "1px 1px 2px rgba(0,0,0,0.5)";
const OVERLAY_Z_INDEX: u32 = 1000;

/// Presentation-side owner of the overlay element.
///
/// Implementations translate styles into whatever the UI toolkit uses.
/// Errors are reported back to the compositor, which logs them.
pub trait OverlayHost: Send + Sync {
    /// Create the element inside the chart display region.
    fn mount(&self, element_id: &str) -> Result<(), WatermarkError>;

    /// Restyle the element.
    fn apply(&self, style: &OverlayStyle) -> Result<(), WatermarkError>;

    /// Remove the element.
    fn unmount(&self);
}

/// Style of the overlay element, mirroring the watermark config.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayStyle {
    pub visible: bool,
    pub text: String,
    /// CSS color including the configured opacity
    pub color: String,
    pub font_size_px: f32,
    pub font_family: String,
    pub font_weight: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
    /// Element opacity (only set for the center position)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    pub text_shadow: &'static str,
}

impl OverlayStyle {
    pub fn from_config(config: &WatermarkConfig) -> Self {
        let inset = Some(format!("{}px", OVERLAY_WATERMARK_INSET_PX));
        let color = config
            .color
            .with_alpha(config.color.alpha_f32() * config.opacity.clamp(0.0, 1.0));

        let mut style = OverlayStyle {
            visible: config.enabled,
            text: config.text.clone(),
            color: color.to_css(),
            font_size_px: config.size,
            font_family: config.font.family.clone(),
            font_weight: config.font.weight.as_css(),
            top: None,
            right: None,
            bottom: None,
            left: None,
            transform: None,
            opacity: None,
            text_shadow: OVERLAY_TEXT_SHADOW,
        };

        match config.position {
            WatermarkPosition::BottomLeft => {
                style.bottom = inset.clone();
                style.left = inset;
            }
            WatermarkPosition::BottomRight => {
                style.bottom = inset.clone();
                style.right = inset;
            }
            WatermarkPosition::TopLeft => {
                style.top = inset.clone();
                style.left = inset;
            }
            WatermarkPosition::TopRight => {
                style.top = inset.clone();
                style.right = inset;
            }
            WatermarkPosition::Center => {
                style.top = Some("50%".to_string());
                style.left = Some("50%".to_string());
                style.transform = Some("translate(-50%, -50%)".to_string());
                style.font_size_px = config.size * CENTER_WATERMARK_SIZE_FACTOR;
                style.opacity = Some(CENTER_WATERMARK_OPACITY);
            }
        }

        style
    }

    /// Render as a CSS declaration block.
    pub fn to_css(&self) -> String {
        let mut decls = vec![
            "position: absolute".to_string(),
            format!("display: {}", if self.visible { "block" } else { "none" }),
            format!("color: {}", self.color),
            format!("font-size: {}px", self.font_size_px),
            format!("font-family: {}", self.font_family),
            format!("font-weight: {}", self.font_weight),
            "pointer-events: none".to_string(),
            format!("z-index: {}", OVERLAY_Z_INDEX),
            "user-select: none".to_string(),
            format!("text-shadow: {}", self.text_shadow),
        ];

        let edges = [
            ("top", &self.top),
            ("right", &self.right),
            ("bottom", &self.bottom),
            ("left", &self.left),
        ];
        for (name, value) in edges {
            if let Some(value) = value {
                decls.push(format!("{}: {}", name, value));
            }
        }
        if let Some(transform) = &self.transform {
            decls.push(format!("transform: {}", transform));
        }
        if let Some(opacity) = self.opacity {
            decls.push(format!("opacity: {}", opacity));
        }

        decls.join("; ")
    }
}

/// The single mounted overlay and the last style pushed to it.
pub(crate) struct LiveOverlay {
    pub(crate) host: std::sync::Arc<dyn OverlayHost>,
    pub(crate) style: OverlayStyle,
}

impl std::fmt::Debug for LiveOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveOverlay")
            .field("style", &self.style)
            .finish()
    }
}
