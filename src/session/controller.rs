//! Tier session controller.
//!
//! Owns the session's current tier. `set_tier` is the only writer and
//! transitions are serialized; readers take a [`TierHandle`] and always see
//! a complete snapshot. A transition
//! stores the new tier first, then pushes its watermark settings, rebuilds
//! the tier-dependent UI and records the change. Failures in those
//! downstream steps are logged and never undo the tier change.

use super::tracking::UsageRecorder;
use crate::capability::{profile_of, Tier, TierProfile};
use crate::error::ChartyError;
use crate::presentation::TierView;
use crate::watermark::{WatermarkCompositor, WatermarkSettings};
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

/// Compositor shared between the controller and the export pipeline.
pub type SharedCompositor = Arc<Mutex<WatermarkCompositor>>;

/// Fully applied tier state.
#[derive(Debug, Clone)]
pub struct TierSnapshot {
    pub tier: Tier,
    pub profile: &'static TierProfile,
    pub since: DateTime<Utc>,
}

impl TierSnapshot {
    fn new(tier: Tier) -> Self {
        Self {
            tier,
            profile: profile_of(tier),
            since: Utc::now(),
        }
    }
}

/// Read-only view of the current tier.
#[derive(Debug, Clone)]
pub struct TierHandle {
    state: Arc<ArcSwap<TierSnapshot>>,
}

impl TierHandle {
    /// Handle that never changes, for callers without a controller.
    pub fn fixed(tier: Tier) -> Self {
        Self {
            state: Arc::new(ArcSwap::from_pointee(TierSnapshot::new(tier))),
        }
    }

    pub fn current(&self) -> Tier {
        self.state.load().tier
    }

    pub fn profile(&self) -> &'static TierProfile {
        self.state.load().profile
    }

    pub fn snapshot(&self) -> Arc<TierSnapshot> {
        self.state.load_full()
    }
}

/// Presentation collaborator rebuilt on every tier transition.
pub trait TierUi: Send + Sync {
    fn rebuild(&self, view: &TierView) -> Result<(), ChartyError>;
}

/// Owner of the current tier.
pub struct TierSessionController {
    state: Arc<ArcSwap<TierSnapshot>>,
    compositor: SharedCompositor,
    ui: Option<Arc<dyn TierUi>>,
    usage: UsageRecorder,
    /// Held for a whole transition
    transition: Mutex<()>,
}

impl std::fmt::Debug for TierSessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TierSessionController")
            .field("tier", &self.current())
            .field("usage", &self.usage)
            .finish()
    }
}

impl TierSessionController {
    /// Start in `initial` and apply its profile.
    pub fn new(initial: Tier, compositor: SharedCompositor, usage: UsageRecorder) -> Self {
        let controller = Self {
            state: Arc::new(ArcSwap::from_pointee(TierSnapshot::new(initial))),
            compositor,
            ui: None,
            usage,
            transition: Mutex::new(()),
        };
        controller.push_watermark(initial);
        tracing::info!(tier = initial.as_str(), "Tier management initialized");
        controller
    }

    /// Attach the presentation collaborator and build it for the current tier.
    pub fn with_ui(mut self, ui: Arc<dyn TierUi>) -> Self {
        self.ui = Some(ui);
        self.rebuild_ui(self.current());
        self
    }

    pub fn handle(&self) -> TierHandle {
        TierHandle {
            state: Arc::clone(&self.state),
        }
    }

    pub fn current(&self) -> Tier {
        self.state.load().tier
    }

    pub fn profile(&self) -> &'static TierProfile {
        self.state.load().profile
    }

    pub fn compositor(&self) -> &SharedCompositor {
        &self.compositor
    }

    pub fn session_id(&self) -> &str {
        self.usage.session_id()
    }

    /// Transition to `tier`. Any tier may follow any other.
    pub fn set_tier(&self, tier: Tier) {
        let _transition = self.transition.lock();
        let previous = self.state.swap(Arc::new(TierSnapshot::new(tier))).tier;

        self.push_watermark(tier);
        self.rebuild_ui(tier);
        self.usage.record(&format!("tier_{}", tier.as_str()), tier);

        tracing::info!(
            from = previous.as_str(),
            to = tier.as_str(),
            "Tier changed"
        );
    }

    fn push_watermark(&self, tier: Tier) {
        let settings = WatermarkSettings::from(&profile_of(tier).features);
        if let Err(e) = self.compositor.lock().apply_settings(&settings) {
            tracing::warn!(tier = tier.as_str(), error = %e, "Failed to apply watermark settings");
        }
    }

    fn rebuild_ui(&self, tier: Tier) {
        let Some(ui) = &self.ui else {
            return;
        };
        if let Err(e) = ui.rebuild(&TierView::for_tier(tier)) {
            tracing::warn!(tier = tier.as_str(), error = %e, "Failed to rebuild tier UI");
        }
    }
}
