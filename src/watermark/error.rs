//! Watermark error types.
//!
//! Defines errors that can occur while styling or compositing watermarks.

use std::fmt;

/// Errors that can occur during watermark processing.
#[derive(Debug, Clone, PartialEq)]
pub enum WatermarkError {
    /// Failed to render text watermark
    RenderError(String),

    /// Invalid configuration (color, opacity, size)
    ConfigError(String),

    /// The live overlay host rejected an update
    OverlayError(String),

    /// Failed to composite watermark onto the surface
    CompositeError(String),
}

impl fmt::Display for WatermarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RenderError(msg) => write!(f, "Failed to render text watermark: {}", msg),
            Self::ConfigError(msg) => write!(f, "Watermark configuration error: {}", msg),
            Self::OverlayError(msg) => write!(f, "Failed to update watermark overlay: {}", msg),
            Self::CompositeError(msg) => write!(f, "Failed to composite watermark: {}", msg),
        }
    }
}

impl std::error::Error for WatermarkError {}
