//! Watermark configuration types.
//!
//! This module defines the live watermark configuration shared by the
//! on-screen overlay and the raster compositor:
//! - Text, color, font and opacity/size settings
//! - Five anchor positions (four corners plus center)
//! - Partial settings pushed by tier transitions
//! - Per-call overrides used while compositing an export

use super::text_renderer::{parse_color, Color};
use super::WatermarkError;
use crate::capability::TierFeatures;
use crate::constants::{
    DEFAULT_WATERMARK_COLOR, DEFAULT_WATERMARK_FONT_FAMILY, DEFAULT_WATERMARK_OPACITY,
    DEFAULT_WATERMARK_SIZE, DEFAULT_WATERMARK_TEXT, MAX_WATERMARK_SIZE,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Watermark anchor on the chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkPosition {
    #[default]
    BottomLeft,
    BottomRight,
    TopLeft,
    TopRight,
    /// Large faint watermark across the middle of the chart
    Center,
}

impl WatermarkPosition {
    pub const ALL: [WatermarkPosition; 5] = [
        WatermarkPosition::BottomLeft,
        WatermarkPosition::BottomRight,
        WatermarkPosition::TopLeft,
        WatermarkPosition::TopRight,
        WatermarkPosition::Center,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::Center => "center",
        }
    }
}

impl fmt::Display for WatermarkPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WatermarkPosition {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        WatermarkPosition::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| WatermarkError::ConfigError(format!("unknown position: {}", s)))
    }
}

/// Font weight of the watermark text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Normal,
    #[default]
    Bold,
}

impl FontWeight {
    pub fn as_css(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Bold => "bold",
        }
    }
}

/// Font used for the watermark text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontDescriptor {
    pub family: String,
    pub weight: FontWeight,
}

impl Default for FontDescriptor {
    fn default() -> Self {
        Self {
            family: DEFAULT_WATERMARK_FONT_FAMILY.to_string(),
            weight: FontWeight::Bold,
        }
    }
}

impl FontDescriptor {
    /// CSS font shorthand for a given size, e.g. `bold 14px Arial, sans-serif`.
    pub fn css_font(&self, size: f32) -> String {
        format!("{} {}px {}", self.weight.as_css(), size, self.family)
    }
}

/// Live watermark configuration. One instance per application session,
/// owned by the compositor and mutated through its setters.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkConfig {
    pub enabled: bool,
    pub text: String,
    /// Opacity from 0.0 (transparent) to 1.0 (opaque)
    pub opacity: f32,
    /// Text size in pixels
    pub size: f32,
    pub position: WatermarkPosition,
    pub color: Color,
    pub font: FontDescriptor,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            text: DEFAULT_WATERMARK_TEXT.to_string(),
            opacity: DEFAULT_WATERMARK_OPACITY,
            size: DEFAULT_WATERMARK_SIZE,
            position: WatermarkPosition::BottomLeft,
            color: Color::white(),
            font: FontDescriptor::default(),
        }
    }
}

impl WatermarkConfig {
    /// Merge an override on top of this config without mutating it.
    pub fn merged(&self, overrides: &WatermarkOverride) -> WatermarkConfig {
        WatermarkConfig {
            enabled: overrides.enabled.unwrap_or(self.enabled),
            text: overrides.text.clone().unwrap_or_else(|| self.text.clone()),
            opacity: overrides.opacity.unwrap_or(self.opacity).clamp(0.0, 1.0),
            size: overrides.size.unwrap_or(self.size),
            position: overrides.position.unwrap_or(self.position),
            color: overrides.color.unwrap_or(self.color),
            font: self.font.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), WatermarkError> {
        if self.text.is_empty() {
            return Err(WatermarkError::ConfigError(
                "Watermark text cannot be empty".to_string(),
            ));
        }

        // Check for NaN/Infinity and valid range
        if !self.opacity.is_finite() || !(0.0..=1.0).contains(&self.opacity) {
            return Err(WatermarkError::ConfigError(format!(
                "Watermark opacity must be a finite value between 0.0 and 1.0, got {}",
                self.opacity
            )));
        }

        if !self.size.is_finite() || self.size <= 0.0 || self.size > MAX_WATERMARK_SIZE {
            return Err(WatermarkError::ConfigError(format!(
                "Watermark size must be between 0 and {} pixels, got {}",
                MAX_WATERMARK_SIZE, self.size
            )));
        }

        Ok(())
    }
}

/// Partial watermark settings, as pushed by a tier transition.
///
/// Absent fields leave the live config untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatermarkSettings {
    pub enabled: Option<bool>,
    pub text: Option<String>,
    pub opacity: Option<f32>,
    pub size: Option<f32>,
    pub position: Option<WatermarkPosition>,
    pub color: Option<Color>,
    pub font: Option<FontDescriptor>,
}

impl From<&TierFeatures> for WatermarkSettings {
    fn from(features: &TierFeatures) -> Self {
        Self {
            enabled: Some(features.watermark),
            opacity: Some(features.watermark_opacity),
            size: Some(features.watermark_size),
            ..Default::default()
        }
    }
}

/// Per-call override merged over the live config while compositing.
/// Never written back to the live config.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatermarkOverride {
    pub enabled: Option<bool>,
    pub text: Option<String>,
    pub opacity: Option<f32>,
    pub size: Option<f32>,
    pub position: Option<WatermarkPosition>,
    pub color: Option<Color>,
}

impl WatermarkOverride {
    /// Override derived from a tier's feature set, anchored bottom-left.
    pub fn for_tier(features: &TierFeatures) -> Self {
        Self {
            enabled: Some(features.watermark),
            opacity: Some(features.watermark_opacity),
            size: Some(features.watermark_size),
            position: Some(WatermarkPosition::BottomLeft),
            ..Default::default()
        }
    }
}

/// Watermark section of the application configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkFileConfig {
    #[serde(default = "default_text")]
    pub text: String,

    /// Text color as hex or rgba() string (default: "#FFFFFF")
    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_font_family")]
    pub font_family: String,

    #[serde(default)]
    pub font_weight: FontWeight,

    /// Optional TTF/OTF file used to rasterize the text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<String>,

    #[serde(default)]
    pub position: WatermarkPosition,
}

fn default_text() -> String {
    DEFAULT_WATERMARK_TEXT.to_string()
}

fn default_color() -> String {
    DEFAULT_WATERMARK_COLOR.to_string()
}

fn default_font_family() -> String {
    DEFAULT_WATERMARK_FONT_FAMILY.to_string()
}

impl Default for WatermarkFileConfig {
    fn default() -> Self {
        Self {
            text: default_text(),
            color: default_color(),
            font_family: default_font_family(),
            font_weight: FontWeight::default(),
            font_path: None,
            position: WatermarkPosition::default(),
        }
    }
}

impl WatermarkFileConfig {
    pub fn validate(&self) -> Result<(), WatermarkError> {
        if self.text.is_empty() {
            return Err(WatermarkError::ConfigError(
                "Watermark 'text' field cannot be empty".to_string(),
            ));
        }
        parse_color(&self.color)?;
        Ok(())
    }

    /// Build the initial live config. Opacity and size come from the tier
    /// profile once the session controller applies it.
    pub fn to_watermark_config(&self) -> Result<WatermarkConfig, WatermarkError> {
        self.validate()?;
        Ok(WatermarkConfig {
            text: self.text.clone(),
            color: parse_color(&self.color)?,
            position: self.position,
            font: FontDescriptor {
                family: self.font_family.clone(),
                weight: self.font_weight,
            },
            ..Default::default()
        })
    }
}
