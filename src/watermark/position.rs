//! Anchor resolution for watermark placement.
//!
//! Each [`WatermarkPosition`] maps to a fixed rule: an anchor point on the
//! surface plus a text alignment and baseline, the way a 2D canvas places
//! `fillText`. Corner anchors sit `padding` units from the edges; the center
//! anchor uses the surface midpoint and renders a larger, faint watermark.
//!
//! # Example
//!
//! ```ignore
//! use charty::watermark::position::{resolve_anchor, ImageDimensions};
//! use charty::watermark::WatermarkPosition;
//!
//! let surface = ImageDimensions { width: 800, height: 600 };
//! let anchor = resolve_anchor(WatermarkPosition::BottomRight, &surface, 14.0, 20);
//! assert_eq!((anchor.x, anchor.y), (780.0, 580.0));
//! ```

use super::WatermarkPosition;
use crate::constants::{CENTER_WATERMARK_OPACITY, CENTER_WATERMARK_SIZE_FACTOR};

/// Dimensions of the target surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Dimensions of the rendered watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatermarkDimensions {
    pub width: u32,
    pub height: u32,
}

/// Top-left corner where a rendered watermark is blended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Horizontal alignment of text relative to the anchor x.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Right,
    Center,
}

/// Vertical alignment of text relative to the anchor y.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextBaseline {
    /// Anchor y is the bottom edge of the text box
    Bottom,
    /// Anchor y is the vertical middle of the text box
    Middle,
}

/// Resolved anchor for one draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
    pub align: TextAlign,
    pub baseline: TextBaseline,
}

/// Font size and opacity actually used at a position.
///
/// Center placement doubles the size and forces a fixed low opacity,
/// regardless of the configured opacity.
pub fn effective_style(position: WatermarkPosition, size: f32, opacity: f32) -> (f32, f32) {
    match position {
        WatermarkPosition::Center => (size * CENTER_WATERMARK_SIZE_FACTOR, CENTER_WATERMARK_OPACITY),
        _ => (size, opacity),
    }
}

/// Resolve the anchor for a position on a surface.
///
/// `size` is the configured (not doubled) text size; top anchors sit one
/// text-size below the padding so the text box starts at the padding line.
pub fn resolve_anchor(
    position: WatermarkPosition,
    surface: &ImageDimensions,
    size: f32,
    padding: u32,
) -> Anchor {
    let w = surface.width as f32;
    let h = surface.height as f32;
    let p = padding as f32;

    match position {
        WatermarkPosition::BottomLeft => Anchor {
            x: p,
            y: h - p,
            align: TextAlign::Left,
            baseline: TextBaseline::Bottom,
        },
        WatermarkPosition::BottomRight => Anchor {
            x: w - p,
            y: h - p,
            align: TextAlign::Right,
            baseline: TextBaseline::Bottom,
        },
        WatermarkPosition::TopLeft => Anchor {
            x: p,
            y: p + size,
            align: TextAlign::Left,
            baseline: TextBaseline::Bottom,
        },
        WatermarkPosition::TopRight => Anchor {
            x: w - p,
            y: p + size,
            align: TextAlign::Right,
            baseline: TextBaseline::Bottom,
        },
        WatermarkPosition::Center => Anchor {
            x: w / 2.0,
            y: h / 2.0,
            align: TextAlign::Center,
            baseline: TextBaseline::Middle,
        },
    }
}

/// Top-left placement of a rendered watermark box for an anchor.
pub fn place(anchor: &Anchor, watermark: &WatermarkDimensions) -> PlacementPosition {
    let ww = watermark.width as f32;
    let wh = watermark.height as f32;

    let x = match anchor.align {
        TextAlign::Left => anchor.x,
        TextAlign::Right => anchor.x - ww,
        TextAlign::Center => anchor.x - ww / 2.0,
    };
    let y = match anchor.baseline {
        TextBaseline::Bottom => anchor.y - wh,
        TextBaseline::Middle => anchor.y - wh / 2.0,
    };

    PlacementPosition::new(x.round() as i32, y.round() as i32)
}

/// Check if a position is at least partially visible within the image.
pub fn is_visible(
    pos: &PlacementPosition,
    image: &ImageDimensions,
    watermark: &WatermarkDimensions,
) -> bool {
    let wm_right = pos.x + watermark.width as i32;
    let wm_bottom = pos.y + watermark.height as i32;

    pos.x < image.width as i32 && pos.y < image.height as i32 && wm_right > 0 && wm_bottom > 0
}
