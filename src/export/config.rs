//! Export configuration and per-call overrides.
//!
//! [`ExportConfig`] is the session's base export setting. A call that wants
//! different settings merges [`ExportOverrides`] into a private copy with
//! [`SharedExportConfig::effective`]. The shared base is never written on the
//! export path, so overlapping exports cannot leak overrides into each other
//! and a failed or abandoned export leaves nothing to restore.

use crate::capability::ExportFormat;
use crate::constants::{
    DEFAULT_BACKGROUND_COLOR, DEFAULT_EXPORT_QUALITY, DEFAULT_EXPORT_SCALE, DEFAULT_OUTPUT_DIR,
    MAX_EXPORT_QUALITY, MAX_EXPORT_SCALE, MIN_EXPORT_QUALITY, MIN_EXPORT_SCALE,
};
use crate::error::ChartyError;
use crate::watermark::{parse_color, Color};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Base export settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    pub format: ExportFormat,
    /// 0.1 - 1.0, only meaningful for lossy formats
    pub quality: f32,
    /// Capture magnification, 1 - 4
    pub scale: u32,
    pub background: Color,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Jpg,
            quality: DEFAULT_EXPORT_QUALITY,
            scale: DEFAULT_EXPORT_SCALE,
            background: Color::black(),
        }
    }
}

impl ExportConfig {
    pub fn set_format(&mut self, format: ExportFormat) {
        self.format = format;
    }

    /// Clamped to 0.1 - 1.0. Non-finite input is ignored.
    pub fn set_quality(&mut self, quality: f32) {
        if quality.is_finite() {
            self.quality = clamp_quality(quality);
        }
    }

    /// Clamped to 1 - 4.
    pub fn set_scale(&mut self, scale: u32) {
        self.scale = clamp_scale(scale);
    }

    pub fn set_background(&mut self, background: Color) {
        self.background = background;
    }

    /// Base config merged with per-call overrides.
    pub fn merged(&self, overrides: &ExportOverrides) -> ExportConfig {
        let mut next = self.clone();
        if let Some(format) = overrides.format {
            next.set_format(format);
        }
        if let Some(quality) = overrides.quality {
            next.set_quality(quality);
        }
        if let Some(scale) = overrides.scale {
            next.set_scale(scale);
        }
        if let Some(background) = overrides.background {
            next.set_background(background);
        }
        next
    }
}

fn clamp_quality(quality: f32) -> f32 {
    quality.clamp(MIN_EXPORT_QUALITY, MAX_EXPORT_QUALITY)
}

fn clamp_scale(scale: u32) -> u32 {
    scale.clamp(MIN_EXPORT_SCALE, MAX_EXPORT_SCALE)
}

/// Per-call export overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportOverrides {
    pub format: Option<ExportFormat>,
    pub quality: Option<f32>,
    pub scale: Option<u32>,
    pub background: Option<Color>,
    /// `Some(false)` suppresses the tier watermark for this call
    pub watermark: Option<bool>,
}

impl ExportOverrides {
    pub fn format(format: ExportFormat) -> Self {
        Self {
            format: Some(format),
            ..Default::default()
        }
    }

    /// Best quality at 3x magnification.
    pub fn high_quality() -> Self {
        Self {
            quality: Some(1.0),
            scale: Some(3),
            ..Default::default()
        }
    }

    /// Smaller files: quality 0.7 at 1x.
    pub fn low_quality() -> Self {
        Self {
            quality: Some(0.7),
            scale: Some(1),
            ..Default::default()
        }
    }

    pub fn without_watermark() -> Self {
        Self {
            watermark: Some(false),
            ..Default::default()
        }
    }
}

/// Shared handle to the session's base export config.
#[derive(Debug, Clone, Default)]
pub struct SharedExportConfig {
    inner: Arc<Mutex<ExportConfig>>,
}

impl SharedExportConfig {
    pub fn new(config: ExportConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(config)),
        }
    }

    /// Copy of the current config.
    pub fn snapshot(&self) -> ExportConfig {
        self.inner.lock().clone()
    }

    pub fn update(&self, f: impl FnOnce(&mut ExportConfig)) {
        f(&mut self.inner.lock());
    }

    /// Base config merged with `overrides`, without touching the base.
    pub fn effective(&self, overrides: &ExportOverrides) -> ExportConfig {
        self.inner.lock().merged(overrides)
    }
}

/// Export section of the application configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportFileConfig {
    #[serde(default)]
    pub format: ExportFormat,

    #[serde(default = "default_quality")]
    pub quality: f32,

    #[serde(default = "default_scale")]
    pub scale: u32,

    #[serde(default = "default_background_color")]
    pub background_color: String,

    /// Directory delivered files are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Upper bound on chart capture; unset waits indefinitely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_timeout_ms: Option<u64>,
}

fn default_quality() -> f32 {
    DEFAULT_EXPORT_QUALITY
}

fn default_scale() -> u32 {
    DEFAULT_EXPORT_SCALE
}

fn default_background_color() -> String {
    DEFAULT_BACKGROUND_COLOR.to_string()
}

fn default_output_dir() -> String {
    DEFAULT_OUTPUT_DIR.to_string()
}

impl Default for ExportFileConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::default(),
            quality: default_quality(),
            scale: default_scale(),
            background_color: default_background_color(),
            output_dir: default_output_dir(),
            capture_timeout_ms: None,
        }
    }
}

impl ExportFileConfig {
    pub fn validate(&self) -> Result<(), ChartyError> {
        if !self.quality.is_finite()
            || !(MIN_EXPORT_QUALITY..=MAX_EXPORT_QUALITY).contains(&self.quality)
        {
            return Err(ChartyError::Config(format!(
                "export.quality must be between {} and {}, got {}",
                MIN_EXPORT_QUALITY, MAX_EXPORT_QUALITY, self.quality
            )));
        }

        if !(MIN_EXPORT_SCALE..=MAX_EXPORT_SCALE).contains(&self.scale) {
            return Err(ChartyError::Config(format!(
                "export.scale must be between {} and {}, got {}",
                MIN_EXPORT_SCALE, MAX_EXPORT_SCALE, self.scale
            )));
        }

        parse_color(&self.background_color)
            .map_err(|e| ChartyError::Config(format!("export.background_color: {}", e)))?;

        if self.output_dir.trim().is_empty() {
            return Err(ChartyError::Config(
                "export.output_dir cannot be empty".to_string(),
            ));
        }

        if self.capture_timeout_ms == Some(0) {
            return Err(ChartyError::Config(
                "export.capture_timeout_ms must be greater than 0 when set".to_string(),
            ));
        }

        Ok(())
    }

    pub fn to_export_config(&self) -> Result<ExportConfig, ChartyError> {
        self.validate()?;
        Ok(ExportConfig {
            format: self.format,
            quality: self.quality,
            scale: self.scale,
            background: parse_color(&self.background_color)?,
        })
    }

    pub fn capture_timeout(&self) -> Option<std::time::Duration> {
        self.capture_timeout_ms.map(std::time::Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExportConfig::default();
        assert_eq!(config.format, ExportFormat::Jpg);
        assert_eq!(config.quality, 0.9);
        assert_eq!(config.scale, 2);
        assert_eq!(config.background, Color::black());
    }

    #[test]
    fn test_quality_and_scale_clamp() {
        let mut config = ExportConfig::default();
        config.set_quality(-5.0);
        assert_eq!(config.quality, 0.1);
        config.set_quality(5.0);
        assert_eq!(config.quality, 1.0);
        config.set_quality(f32::NAN);
        assert_eq!(config.quality, 1.0);

        config.set_scale(0);
        assert_eq!(config.scale, 1);
        config.set_scale(99);
        assert_eq!(config.scale, 4);
    }

    #[test]
    fn test_presets() {
        let base = ExportConfig::default();
        let high = base.merged(&ExportOverrides::high_quality());
        assert_eq!((high.quality, high.scale), (1.0, 3));
        let low = base.merged(&ExportOverrides::low_quality());
        assert_eq!((low.quality, low.scale), (0.7, 1));
        assert_eq!(ExportOverrides::without_watermark().watermark, Some(false));
    }

    #[test]
    fn test_effective_leaves_base_untouched() {
        let shared = SharedExportConfig::default();
        let effective = shared.effective(&ExportOverrides {
            quality: Some(1.0),
            format: Some(ExportFormat::Png),
            ..Default::default()
        });
        assert_eq!(effective.quality, 1.0);
        assert_eq!(effective.format, ExportFormat::Png);
        assert_eq!(shared.snapshot(), ExportConfig::default());
    }

    #[test]
    fn test_effective_sees_base_updates() {
        let shared = SharedExportConfig::default();
        shared.update(|c| c.set_scale(4));
        let effective = shared.effective(&ExportOverrides::format(ExportFormat::Pdf));
        assert_eq!((effective.scale, effective.format), (4, ExportFormat::Pdf));
    }

    #[test]
    fn test_file_config_validation() {
        assert!(ExportFileConfig::default().validate().is_ok());

        let bad_quality = ExportFileConfig {
            quality: 1.5,
            ..Default::default()
        };
        assert!(bad_quality.validate().is_err());

        let bad_scale = ExportFileConfig {
            scale: 8,
            ..Default::default()
        };
        assert!(bad_scale.validate().is_err());

        let bad_color = ExportFileConfig {
            background_color: "black".to_string(),
            ..Default::default()
        };
        assert!(bad_color.validate().is_err());

        let zero_timeout = ExportFileConfig {
            capture_timeout_ms: Some(0),
            ..Default::default()
        };
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn test_file_config_to_export_config() {
        let file: ExportFileConfig = serde_yaml::from_str(
            "format: png\nquality: 0.5\nscale: 3\nbackground_color: \"#fff\"\ncapture_timeout_ms: 1500\n",
        )
        .unwrap();
        let config = file.to_export_config().unwrap();
        assert_eq!(config.format, ExportFormat::Png);
        assert_eq!(config.scale, 3);
        assert_eq!(config.background, Color::white());
        assert_eq!(
            file.capture_timeout(),
            Some(std::time::Duration::from_millis(1500))
        );
    }
}
