//! Export filename generation.
//!
//! `<product>-<sanitized-title>-<timestamp>.<ext>`, where the timestamp is
//! the UTC time truncated to whole seconds with `:` replaced by `-`, e.g.
//! `getcharty-quarterly-sales-2024-03-05T14-07-09.jpg`.

use crate::constants::DEFAULT_CHART_TITLE;
use chrono::{DateTime, Utc};

/// Strip everything except ASCII letters, digits, whitespace and `-`,
/// collapse whitespace runs to a single `-` and lower-case the result.
pub fn sanitize_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();

    kept.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Filesystem-safe timestamp with second precision.
pub fn export_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H-%M-%S").to_string()
}

/// Build the delivered filename.
///
/// A title that is empty, or that sanitizes to nothing, falls back to
/// `chart`.
pub fn generate_export_filename(
    product: &str,
    title: Option<&str>,
    extension: &str,
    at: DateTime<Utc>,
) -> String {
    let sanitized = title.map(sanitize_title).unwrap_or_default();
    let title = if sanitized.is_empty() {
        DEFAULT_CHART_TITLE.to_string()
    } else {
        sanitized
    };

    format!(
        "{}-{}-{}.{}",
        product,
        title,
        export_timestamp(at),
        extension
    )
}
