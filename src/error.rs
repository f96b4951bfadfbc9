// Error types module

use crate::capability::Tier;
use crate::watermark::WatermarkError;
use thiserror::Error;

/// Centralized error type for the export layer
///
/// Every variant carries owned, cloneable data so one failure can be handed
/// to several waiters (e.g. all callers awaiting the same rasterizer load).
#[derive(Error, Debug, Clone)]
pub enum ChartyError {
    /// No renderable chart content (user must generate a chart first)
    #[error("No chart to export: {0}")]
    NoChart(String),

    /// Rasterization dependency missing, failed or timed out
    #[error("Chart capture failed: {0}")]
    Capture(String),

    /// Feature name outside the declared feature set
    #[error("Unknown feature '{0}'")]
    UnknownFeature(String),

    /// Requested format/channel is above the current tier
    #[error("{capability} requires {required} tier (current tier: {current})")]
    PermissionDenied {
        capability: String,
        required: Tier,
        current: Tier,
    },

    /// Encoding to the target format failed
    #[error("Failed to encode {format}: {message}")]
    Encode { format: String, message: String },

    /// Encoded payload exceeds the tier's file-size limit
    #[error("Exported file is {size} bytes, exceeding the {max_size} byte limit")]
    FileTooLarge { size: usize, max_size: usize },

    #[error(transparent)]
    Watermark(#[from] WatermarkError),

    /// Invalid user or caller supplied parameter
    #[error("Invalid parameter '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    /// Configuration errors (invalid YAML, missing env vars, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local session store could not be read or written
    #[error("Session store error: {0}")]
    Session(String),

    /// File delivery collaborator rejected the payload
    #[error("File delivery failed: {0}")]
    Delivery(String),
}

impl ChartyError {
    pub fn invalid_param(param: impl Into<String>, message: impl Into<String>) -> Self {
        ChartyError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    pub fn encode_failed(format: impl Into<String>, message: impl Into<String>) -> Self {
        ChartyError::Encode {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Whether the user can resolve this by acting (generate a chart, retry, upgrade).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ChartyError::NoChart(_)
                | ChartyError::Capture(_)
                | ChartyError::PermissionDenied { .. }
                | ChartyError::FileTooLarge { .. }
                | ChartyError::Delivery(_)
        )
    }

    /// Plain descriptive message for the user.
    pub fn user_message(&self) -> String {
        match self {
            ChartyError::NoChart(_) => {
                "No chart to export. Please generate a chart first.".to_string()
            }
            ChartyError::Capture(msg) => {
                format!("Export functionality unavailable ({}). Please try again.", msg)
            }
            ChartyError::PermissionDenied {
                capability,
                required,
                ..
            } => format!(
                "{} requires {} membership. Upgrade now to unlock this feature!",
                capability, required
            ),
            ChartyError::FileTooLarge { max_size, .. } => format!(
                "The exported file exceeds your plan's {} MB limit. Try a lower quality or scale.",
                max_size / (1024 * 1024)
            ),
            other => format!("Export failed: {}", other),
        }
    }
}
