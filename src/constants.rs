// Constants module - centralized default values for configuration
//
// This module defines all default values used throughout the codebase.
// Using constants instead of magic numbers keeps the tier tables, the
// watermark geometry and the export defaults in one place.

// =============================================================================
// Product defaults
// =============================================================================

/// Product prefix used in exported filenames
pub const DEFAULT_PRODUCT: &str = "getcharty";

/// Chart title used when the chart has none
pub const DEFAULT_CHART_TITLE: &str = "chart";

// =============================================================================
// Export defaults
// =============================================================================

/// Default export quality (0.1 - 1.0)
pub const DEFAULT_EXPORT_QUALITY: f32 = 0.9;

/// Lowest accepted export quality
pub const MIN_EXPORT_QUALITY: f32 = 0.1;

/// Highest accepted export quality
pub const MAX_EXPORT_QUALITY: f32 = 1.0;

/// Default capture magnification
pub const DEFAULT_EXPORT_SCALE: u32 = 2;

/// Lowest accepted capture magnification
pub const MIN_EXPORT_SCALE: u32 = 1;

/// Highest accepted capture magnification
pub const MAX_EXPORT_SCALE: u32 = 4;

/// Default capture background color
pub const DEFAULT_BACKGROUND_COLOR: &str = "#000000";

/// Default directory exported files are written to
pub const DEFAULT_OUTPUT_DIR: &str = "exports";

// =============================================================================
// Watermark defaults
// =============================================================================

/// Default watermark text
pub const DEFAULT_WATERMARK_TEXT: &str = "GetCharty.com";

/// Default watermark opacity
pub const DEFAULT_WATERMARK_OPACITY: f32 = 0.4;

/// Default watermark size in pixels
pub const DEFAULT_WATERMARK_SIZE: f32 = 14.0;

/// Largest accepted watermark size in pixels
pub const MAX_WATERMARK_SIZE: f32 = 256.0;

/// Default watermark color
pub const DEFAULT_WATERMARK_COLOR: &str = "#FFFFFF";

/// Default watermark font family
pub const DEFAULT_WATERMARK_FONT_FAMILY: &str = "Arial, sans-serif";

/// Padding from the surface edge for corner anchors on exported images
pub const RASTER_WATERMARK_PADDING: u32 = 20;

/// Inset from the chart edge for corner anchors on the live overlay
pub const OVERLAY_WATERMARK_INSET_PX: u32 = 15;

/// Opacity forced for center-anchored watermarks
pub const CENTER_WATERMARK_OPACITY: f32 = 0.1;

/// Font size multiplier for center-anchored watermarks
pub const CENTER_WATERMARK_SIZE_FACTOR: f32 = 2.0;

/// Drop shadow alpha (0.0 - 1.0)
pub const WATERMARK_SHADOW_ALPHA: f32 = 0.5;

/// Drop shadow blur radius in pixels
pub const WATERMARK_SHADOW_BLUR: f32 = 2.0;

/// Drop shadow offset in pixels (x and y)
pub const WATERMARK_SHADOW_OFFSET: i32 = 1;

// =============================================================================
// Session defaults
// =============================================================================

/// Storage key holding the session identifier
pub const DEFAULT_SESSION_KEY: &str = "getcharty_session_id";

/// Default path of the local session store
pub const DEFAULT_SESSION_STORE_PATH: &str = ".getcharty/session.json";

/// Claim carrying the subscription tier in signed tier tokens
pub const DEFAULT_TIER_CLAIM: &str = "tier";

// =============================================================================
// Logging defaults
// =============================================================================

/// Default log level filter
pub const DEFAULT_LOG_LEVEL: &str = "info";
