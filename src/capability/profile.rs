//! Static tier profiles: feature flags and usage limits per tier.
//!
//! Profiles are defined once as constants and never mutated. Feature names
//! form a closed set ([`Feature`]); string lookups outside that set fail with
//! [`ChartyError::UnknownFeature`] instead of silently defaulting.

use super::Tier;
use crate::error::ChartyError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Closed set of tier-gated features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    Watermark,
    WatermarkOpacity,
    WatermarkSize,
    ExportJpg,
    AutoSpacing,
    AdvancedCharts,
    CustomBranding,
}

impl Feature {
    pub const ALL: [Feature; 7] = [
        Feature::Watermark,
        Feature::WatermarkOpacity,
        Feature::WatermarkSize,
        Feature::ExportJpg,
        Feature::AutoSpacing,
        Feature::AdvancedCharts,
        Feature::CustomBranding,
    ];

    /// Canonical (kebab-case) feature name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Watermark => "watermark",
            Self::WatermarkOpacity => "watermark-opacity",
            Self::WatermarkSize => "watermark-size",
            Self::ExportJpg => "export-jpg",
            Self::AutoSpacing => "auto-spacing",
            Self::AdvancedCharts => "advanced-charts",
            Self::CustomBranding => "custom-branding",
        }
    }

    /// camelCase alias accepted for configuration written against the web client.
    fn camel_name(&self) -> &'static str {
        match self {
            Self::Watermark => "watermark",
            Self::WatermarkOpacity => "watermarkOpacity",
            Self::WatermarkSize => "watermarkSize",
            Self::ExportJpg => "exportJPG",
            Self::AutoSpacing => "autoSpacing",
            Self::AdvancedCharts => "advancedCharts",
            Self::CustomBranding => "customBranding",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = ChartyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Feature::ALL
            .into_iter()
            .find(|f| {
                f.name().eq_ignore_ascii_case(trimmed) || f.camel_name().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| ChartyError::UnknownFeature(trimmed.to_string()))
    }
}

/// Value of a feature in a tier profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Flag(bool),
    Number(f32),
}

impl FeatureValue {
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(v) => Some(*v),
            Self::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f32> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Flag(_) => None,
        }
    }

    /// Truthiness as the UI treats it: flags as-is, numbers when non-zero.
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Flag(v) => *v,
            Self::Number(v) => *v != 0.0,
        }
    }
}

/// Feature set of a tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierFeatures {
    /// Exported images carry the watermark
    pub watermark: bool,
    /// Watermark opacity (0.0 to 1.0)
    pub watermark_opacity: f32,
    /// Watermark size in points
    pub watermark_size: f32,
    pub export_jpg: bool,
    pub auto_spacing: bool,
    pub advanced_charts: bool,
    pub custom_branding: bool,
}

impl TierFeatures {
    /// Look up a single feature.
    pub fn get(&self, feature: Feature) -> FeatureValue {
        match feature {
            Feature::Watermark => FeatureValue::Flag(self.watermark),
            Feature::WatermarkOpacity => FeatureValue::Number(self.watermark_opacity),
            Feature::WatermarkSize => FeatureValue::Number(self.watermark_size),
            Feature::ExportJpg => FeatureValue::Flag(self.export_jpg),
            Feature::AutoSpacing => FeatureValue::Flag(self.auto_spacing),
            Feature::AdvancedCharts => FeatureValue::Flag(self.advanced_charts),
            Feature::CustomBranding => FeatureValue::Flag(self.custom_branding),
        }
    }
}

/// Usage limits of a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierLimits {
    /// Charts per month, `-1` for unlimited
    pub monthly_charts: i32,
    /// Largest exported file in megabytes
    pub max_file_size_mb: u32,
}

impl TierLimits {
    pub fn is_unlimited(&self) -> bool {
        self.monthly_charts < 0
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb as usize * 1024 * 1024
    }
}

/// Immutable feature/limit set keyed by tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierProfile {
    pub tier: Tier,
    pub features: TierFeatures,
    pub limits: TierLimits,
}

impl TierProfile {
    pub fn feature(&self, feature: Feature) -> FeatureValue {
        self.features.get(feature)
    }
}

const NOOB_PROFILE: TierProfile = TierProfile {
    tier: Tier::Noob,
    features: TierFeatures {
        watermark: true,
        watermark_opacity: 0.4,
        watermark_size: 14.0,
        export_jpg: true,
        auto_spacing: false,
        advanced_charts: false,
        custom_branding: false,
    },
    limits: TierLimits {
        monthly_charts: 10,
        max_file_size_mb: 5,
    },
};

const REGISTERED_PROFILE: TierProfile = TierProfile {
    tier: Tier::Registered,
    features: TierFeatures {
        watermark: true,
        watermark_opacity: 0.4,
        watermark_size: 14.0,
        export_jpg: true,
        auto_spacing: true,
        advanced_charts: true,
        custom_branding: false,
    },
    limits: TierLimits {
        monthly_charts: 50,
        max_file_size_mb: 10,
    },
};

const VIPER_PROFILE: TierProfile = TierProfile {
    tier: Tier::Viper,
    features: TierFeatures {
        watermark: false,
        watermark_opacity: 0.2,
        watermark_size: 12.0,
        export_jpg: true,
        auto_spacing: true,
        advanced_charts: true,
        custom_branding: true,
    },
    limits: TierLimits {
        monthly_charts: -1,
        max_file_size_mb: 25,
    },
};

/// Profile of a tier. Total over the closed tier set.
pub fn profile_of(tier: Tier) -> &'static TierProfile {
    match tier {
        Tier::Noob => &NOOB_PROFILE,
        Tier::Registered => &REGISTERED_PROFILE,
        Tier::Viper => &VIPER_PROFILE,
    }
}

/// Look up a feature by name in a tier's profile.
///
/// Accepts canonical kebab-case names (`watermark-opacity`) and the camelCase
/// names used by the web client (`watermarkOpacity`).
///
/// # Errors
///
/// [`ChartyError::UnknownFeature`] if the name is not declared for any tier.
pub fn feature_value(tier: Tier, name: &str) -> Result<FeatureValue, ChartyError> {
    let feature: Feature = name.parse()?;
    Ok(profile_of(tier).feature(feature))
}
