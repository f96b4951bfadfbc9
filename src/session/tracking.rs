//! Usage tracking.
//!
//! Tracking is best-effort: sinks are called synchronously and must not
//! block, and a failing sink never fails the operation being tracked.

use crate::capability::Tier;
use crate::error::ChartyError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// One tracked action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageEvent {
    /// e.g. `export_jpg`, `share_email`, `tier_changed`
    pub action: String,
    pub tier: Tier,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Sink for usage events.
pub trait UsageTracker: Send + Sync {
    fn track(&self, event: &UsageEvent) -> Result<(), ChartyError>;
}

/// Emits each event as a structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogUsageTracker;

impl UsageTracker for LogUsageTracker {
    fn track(&self, event: &UsageEvent) -> Result<(), ChartyError> {
        tracing::info!(
            action = %event.action,
            tier = %event.tier.as_str(),
            session_id = %event.session_id,
            timestamp = %event.timestamp.to_rfc3339(),
            "Usage tracked"
        );
        Ok(())
    }
}

/// Keeps events in memory.
#[derive(Debug, Default)]
pub struct RecordingTracker {
    events: Mutex<Vec<UsageEvent>>,
}

impl RecordingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<UsageEvent> {
        self.events.lock().clone()
    }

    pub fn actions(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.action.clone()).collect()
    }
}

impl UsageTracker for RecordingTracker {
    fn track(&self, event: &UsageEvent) -> Result<(), ChartyError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Binds a tracker to the session and swallows its failures.
#[derive(Clone)]
pub struct UsageRecorder {
    tracker: Arc<dyn UsageTracker>,
    session_id: Arc<str>,
}

impl std::fmt::Debug for UsageRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageRecorder")
            .field("session_id", &self.session_id)
            .finish()
    }
}

impl UsageRecorder {
    pub fn new(tracker: Arc<dyn UsageTracker>, session_id: impl Into<Arc<str>>) -> Self {
        Self {
            tracker,
            session_id: session_id.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn record(&self, action: &str, tier: Tier) {
        let event = UsageEvent {
            action: action.to_string(),
            tier,
            session_id: self.session_id.to_string(),
            timestamp: Utc::now(),
        };
        if let Err(e) = self.tracker.track(&event) {
            tracing::warn!(action = action, error = %e, "Usage tracking failed");
        }
    }
}
