//! Session state: current tier, session identifier and usage tracking.

pub mod controller;
pub mod detection;
pub mod store;
pub mod tracking;

pub use controller::{SharedCompositor, TierHandle, TierSessionController, TierSnapshot, TierUi};
pub use detection::{StubTierDetector, TierClaims, TierDetector, TokenTierDetector};
pub use store::{
    generate_session_id, FileSessionStore, MemorySessionStore, Session, SessionStore,
};
pub use tracking::{LogUsageTracker, RecordingTracker, UsageEvent, UsageRecorder, UsageTracker};
