//! Subscription tiers.
//!
//! Tiers are totally ordered by privilege: `Noob < Registered < Viper`.
//! The derived `Ord` follows declaration order, so permission checks are
//! plain comparisons (`required <= current`).

use crate::error::ChartyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscription level gating feature, format and channel access.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Anonymous visitor (lowest privilege)
    #[default]
    Noob,
    /// Free registered account
    Registered,
    /// Paid subscription (highest privilege)
    Viper,
}

impl Tier {
    /// All tiers, lowest privilege first.
    pub const ALL: [Tier; 3] = [Tier::Noob, Tier::Registered, Tier::Viper];

    /// The most privileged tier. Unknown capabilities require this tier.
    pub const HIGHEST: Tier = Tier::Viper;

    /// Identifier used in configuration, tokens and usage events.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Noob => "noob",
            Self::Registered => "registered",
            Self::Viper => "viper",
        }
    }

    /// Human-readable tier name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Noob => "Noob",
            Self::Registered => "Registered",
            Self::Viper => "VIPer",
        }
    }

    /// The tier a user of this tier would upgrade to, if any.
    pub fn next(&self) -> Option<Tier> {
        match self {
            Self::Noob => Some(Self::Registered),
            Self::Registered => Some(Self::Viper),
            Self::Viper => None,
        }
    }

    /// Export resolution label shown next to the JPG button.
    pub fn quality_label(&self) -> &'static str {
        match self {
            Self::Noob => "720p",
            Self::Registered => "1080p",
            Self::Viper => "4K",
        }
    }

    /// Fill percentage of the tier progression bar.
    pub fn progress_percent(&self) -> u8 {
        match self {
            Self::Noob => 25,
            Self::Registered => 60,
            Self::Viper => 100,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Tier {
    type Err = ChartyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "noob" => Ok(Tier::Noob),
            "registered" => Ok(Tier::Registered),
            "viper" => Ok(Tier::Viper),
            other => Err(ChartyError::invalid_param(
                "tier",
                format!("unknown tier: {}", other),
            )),
        }
    }
}
