//! Watermark module for branding chart exports.
//!
//! One [`WatermarkConfig`] per session drives two outputs:
//!
//! - **Raster compositing**: text drawn onto captured chart surfaces at one of
//!   five anchors, with a drop shadow for legibility
//! - **Live overlay**: an on-screen element whose style mirrors the config
//!
//! Tier transitions push [`WatermarkSettings`] into the compositor; exports
//! pass a [`WatermarkOverride`] that is merged per call and never stored.
//!
//! # Configuration Example
//!
//! ```yaml
//! watermark:
//!   text: "GetCharty.com"
//!   color: "#FFFFFF"
//!   font_family: "Arial, sans-serif"
//!   font_weight: bold
//!   position: bottom-left
//! ```

pub mod compositor;
pub mod config;
pub mod error;
pub mod overlay;
pub mod position;
pub mod text_renderer;

pub use compositor::WatermarkCompositor;
pub use config::{
    FontDescriptor, FontWeight, WatermarkConfig, WatermarkFileConfig, WatermarkOverride,
    WatermarkPosition, WatermarkSettings,
};
pub use error::WatermarkError;
pub use overlay::{OverlayHost, OverlayStyle, OVERLAY_ELEMENT_ID};
pub use position::{
    effective_style, is_visible, place, resolve_anchor, Anchor, ImageDimensions,
    PlacementPosition, TextAlign, TextBaseline, WatermarkDimensions,
};
pub use text_renderer::{
    default_font, measure_text, parse_color, parse_hex_color, render_text, Color, GlyphFont,
    TextMetrics, TextRenderOptions,
};
