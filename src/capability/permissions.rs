//! Format and channel permissions.
//!
//! Every export format and share channel has a statically declared minimum
//! tier. A capability is available iff `required_tier(capability) <= tier`.
//! Anything missing from the requirement tables requires [`Tier::HIGHEST`],
//! so an unknown capability is never granted by default.

use super::Tier;
use crate::error::ChartyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// File formats a chart can be exported to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Jpg,
    Pdf,
    Html,
    Svg,
    Png,
}

impl ExportFormat {
    /// All formats in button order.
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Jpg,
        ExportFormat::Pdf,
        ExportFormat::Html,
        ExportFormat::Svg,
        ExportFormat::Png,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Pdf => "pdf",
            Self::Html => "html",
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Jpg => "JPG",
            Self::Pdf => "PDF",
            Self::Html => "HTML",
            Self::Svg => "SVG",
            Self::Png => "PNG",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Jpg => "image/jpeg",
            Self::Pdf => "application/pdf",
            Self::Html => "text/html",
            Self::Svg => "image/svg+xml",
            Self::Png => "image/png",
        }
    }

    /// Whether the encoding discards detail according to a quality setting.
    pub fn is_lossy(&self) -> bool {
        matches!(self, Self::Jpg | Self::Pdf)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ExportFormat {
    type Err = ChartyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(ExportFormat::Jpg),
            "pdf" => Ok(ExportFormat::Pdf),
            "html" | "htm" => Ok(ExportFormat::Html),
            "svg" => Ok(ExportFormat::Svg),
            "png" => Ok(ExportFormat::Png),
            other => Err(ChartyError::invalid_param(
                "format",
                format!("unknown format: {}", other),
            )),
        }
    }
}

/// Channels a chart can be shared through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareChannel {
    Socials,
    Permalink,
    Email,
}

impl ShareChannel {
    pub const ALL: [ShareChannel; 3] = [
        ShareChannel::Socials,
        ShareChannel::Permalink,
        ShareChannel::Email,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Socials => "socials",
            Self::Permalink => "permalink",
            Self::Email => "email",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Socials => "Socials",
            Self::Permalink => "Permalink",
            Self::Email => "Email",
        }
    }
}

impl fmt::Display for ShareChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ShareChannel {
    type Err = ChartyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "socials" | "social" => Ok(ShareChannel::Socials),
            "permalink" | "link" => Ok(ShareChannel::Permalink),
            "email" | "mail" => Ok(ShareChannel::Email),
            other => Err(ChartyError::invalid_param(
                "channel",
                format!("unknown share channel: {}", other),
            )),
        }
    }
}

/// Anything gated by tier: an export format or a share channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Format(ExportFormat),
    Channel(ShareChannel),
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Format(f) => f.as_str(),
            Self::Channel(c) => c.as_str(),
        }
    }

    /// Description used in permission messages, e.g. "PNG export".
    pub fn describe(&self) -> String {
        match self {
            Self::Format(f) => format!("{} export", f.label()),
            Self::Channel(c) => format!("{} sharing", c.label()),
        }
    }
}

impl From<ExportFormat> for Capability {
    fn from(format: ExportFormat) -> Self {
        Capability::Format(format)
    }
}

impl From<ShareChannel> for Capability {
    fn from(channel: ShareChannel) -> Self {
        Capability::Channel(channel)
    }
}

impl FromStr for Capability {
    type Err = ChartyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(format) = s.parse::<ExportFormat>() {
            return Ok(Capability::Format(format));
        }
        if let Ok(channel) = s.parse::<ShareChannel>() {
            return Ok(Capability::Channel(channel));
        }
        Err(ChartyError::invalid_param(
            "capability",
            format!("unknown export format or share channel: {}", s.trim()),
        ))
    }
}

const FORMAT_REQUIREMENTS: &[(ExportFormat, Tier)] = &[
    (ExportFormat::Jpg, Tier::Noob),
    (ExportFormat::Pdf, Tier::Registered),
    (ExportFormat::Html, Tier::Registered),
    (ExportFormat::Svg, Tier::Viper),
    (ExportFormat::Png, Tier::Viper),
];

const CHANNEL_REQUIREMENTS: &[(ShareChannel, Tier)] = &[
    (ShareChannel::Socials, Tier::Noob),
    (ShareChannel::Permalink, Tier::Registered),
    (ShareChannel::Email, Tier::Viper),
];

/// Minimum tier required for a capability.
pub fn required_tier(capability: impl Into<Capability>) -> Tier {
    match capability.into() {
        Capability::Format(format) => FORMAT_REQUIREMENTS
            .iter()
            .find(|(f, _)| *f == format)
            .map(|(_, tier)| *tier)
            .unwrap_or(Tier::HIGHEST),
        Capability::Channel(channel) => CHANNEL_REQUIREMENTS
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, tier)| *tier)
            .unwrap_or(Tier::HIGHEST),
    }
}

/// Minimum tier required for a capability given by name.
///
/// Names that are neither a known format nor a known channel require the
/// highest tier.
pub fn required_tier_for_name(name: &str) -> Tier {
    name.parse::<Capability>()
        .map(required_tier)
        .unwrap_or(Tier::HIGHEST)
}

pub fn is_format_available(tier: Tier, format: ExportFormat) -> bool {
    required_tier(format) <= tier
}

pub fn is_channel_available(tier: Tier, channel: ShareChannel) -> bool {
    required_tier(channel) <= tier
}

pub fn is_available(tier: Tier, capability: impl Into<Capability>) -> bool {
    required_tier(capability) <= tier
}

/// Check a capability against a tier.
///
/// # Errors
///
/// [`ChartyError::PermissionDenied`] naming the required tier.
pub fn ensure_available(tier: Tier, capability: impl Into<Capability>) -> Result<(), ChartyError> {
    let capability = capability.into();
    let required = required_tier(capability);
    if required <= tier {
        Ok(())
    } else {
        Err(ChartyError::PermissionDenied {
            capability: capability.describe(),
            required,
            current: tier,
        })
    }
}

/// Formats available at a tier, in button order.
pub fn permitted_formats(tier: Tier) -> Vec<ExportFormat> {
    ExportFormat::ALL
        .into_iter()
        .filter(|f| is_format_available(tier, *f))
        .collect()
}

/// Channels available at a tier, in button order.
pub fn permitted_channels(tier: Tier) -> Vec<ShareChannel> {
    ShareChannel::ALL
        .into_iter()
        .filter(|c| is_channel_available(tier, *c))
        .collect()
}
