// Charty: tier-gated chart export library

pub mod capability; // Tier -> feature set -> format/channel permissions
pub mod config;
pub mod constants;
pub mod error;
pub mod export; // Capture -> watermark -> encode -> deliver
pub mod logging;
pub mod presentation;
pub mod session; // Current tier, session id, usage tracking
pub mod watermark;
