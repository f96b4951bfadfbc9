// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_LOG_LEVEL, DEFAULT_PRODUCT, DEFAULT_SESSION_KEY, DEFAULT_SESSION_STORE_PATH,
    DEFAULT_TIER_CLAIM,
};
use crate::error::ChartyError;
use crate::export::ExportFileConfig;
use crate::session::{StubTierDetector, TierDetector, TokenTierDetector};
use crate::watermark::WatermarkFileConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Product name used as the export filename prefix
    #[serde(default = "default_product")]
    pub product: String,
    #[serde(default)]
    pub export: ExportFileConfig,
    #[serde(default)]
    pub watermark: WatermarkFileConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub tier_detection: TierDetectionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_product() -> String {
    DEFAULT_PRODUCT.to_string()
}

/// Where the session identifier is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    #[serde(default = "default_session_key")]
    pub key: String,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_SESSION_STORE_PATH)
}

fn default_session_key() -> String {
    DEFAULT_SESSION_KEY.to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            key: default_session_key(),
        }
    }
}

/// How the starting tier is determined
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TierDetectionMode {
    /// Every session starts as Noob
    #[default]
    Stub,
    /// Tier read from a signed token
    Token,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierDetectionConfig {
    #[serde(default)]
    pub mode: TierDetectionMode,
    /// HS256 secret for tier tokens (required in token mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default = "default_claim")]
    pub claim: String,
}

fn default_claim() -> String {
    DEFAULT_TIER_CLAIM.to_string()
}

impl Default for TierDetectionConfig {
    fn default() -> Self {
        Self {
            mode: TierDetectionMode::default(),
            secret: None,
            claim: default_claim(),
        }
    }
}

impl TierDetectionConfig {
    /// Build the detector for this mode. `token` is the presented tier token, if any.
    pub fn detector(&self, token: Option<String>) -> Result<Box<dyn TierDetector>, ChartyError> {
        match self.mode {
            TierDetectionMode::Stub => Ok(Box::new(StubTierDetector)),
            TierDetectionMode::Token => {
                let secret = self.secret.as_deref().ok_or_else(|| {
                    ChartyError::Config("tier_detection.secret is required in token mode".to_string())
                })?;
                Ok(Box::new(
                    TokenTierDetector::new(secret, token).with_claim(self.claim.clone()),
                ))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, ChartyError> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| ChartyError::Config(e.to_string()))?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                ChartyError::Config(format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                ))
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        // An empty document means all defaults
        if substituted.trim().is_empty() {
            return Ok(Config::default());
        }

        serde_yaml::from_str(&substituted)
            .map_err(|e| ChartyError::Config(format!("Invalid configuration: {}", e)))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ChartyError> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| ChartyError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), ChartyError> {
        if self.product.trim().is_empty() {
            return Err(ChartyError::Config("product cannot be empty".to_string()));
        }

        self.export.validate()?;
        self.watermark
            .validate()
            .map_err(|e| ChartyError::Config(format!("watermark: {}", e)))?;

        if self.session.key.trim().is_empty() {
            return Err(ChartyError::Config("session.key cannot be empty".to_string()));
        }

        if self.tier_detection.mode == TierDetectionMode::Token {
            match self.tier_detection.secret.as_deref() {
                Some(secret) if !secret.is_empty() => {}
                _ => {
                    return Err(ChartyError::Config(
                        "tier_detection.secret is required in token mode".to_string(),
                    ))
                }
            }
            if self.tier_detection.claim.trim().is_empty() {
                return Err(ChartyError::Config(
                    "tier_detection.claim cannot be empty".to_string(),
                ));
            }
        }

        if self.logging.level.trim().is_empty() {
            return Err(ChartyError::Config("logging.level cannot be empty".to_string()));
        }

        Ok(())
    }
}
