//! Capability model: tier → feature set → format/channel permissions.
//!
//! Pure data and pure functions. Nothing here reads ambient state; the
//! caller always passes the tier it wants answers for, so results are
//! identical for identical inputs.
//!
//! # Example
//!
//! ```
//! use charty::capability::{is_format_available, profile_of, ExportFormat, Tier};
//!
//! assert!(is_format_available(Tier::Noob, ExportFormat::Jpg));
//! assert!(!is_format_available(Tier::Registered, ExportFormat::Png));
//! assert!(!profile_of(Tier::Viper).features.watermark);
//! ```

pub mod permissions;
pub mod profile;
pub mod tier;

pub use permissions::{
    ensure_available, is_available, is_channel_available, is_format_available,
    permitted_channels, permitted_formats, required_tier, required_tier_for_name, Capability,
    ExportFormat, ShareChannel,
};
pub use profile::{
    feature_value, profile_of, Feature, FeatureValue, TierFeatures, TierLimits, TierProfile,
};
pub use tier::Tier;
