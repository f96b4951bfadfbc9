// Tier session tests: transitions, UI rebuilds, session persistence

use charty::capability::{profile_of, Tier};
use charty::error::ChartyError;
use charty::presentation::TierView;
use charty::session::{
    FileSessionStore, RecordingTracker, Session, SessionStore, SharedCompositor,
    TierSessionController, TierUi, UsageRecorder,
};
use charty::watermark::{GlyphFont, WatermarkCompositor, WatermarkConfig};
use parking_lot::Mutex;
use rstest::rstest;
use std::sync::Arc;
use tempfile::TempDir;

fn compositor() -> SharedCompositor {
    Arc::new(Mutex::new(WatermarkCompositor::with_font(
        WatermarkConfig::default(),
        Arc::new(GlyphFont::Bitmap),
    )))
}

fn controller(initial: Tier) -> (TierSessionController, Arc<RecordingTracker>) {
    let tracker = Arc::new(RecordingTracker::new());
    let controller = TierSessionController::new(
        initial,
        compositor(),
        UsageRecorder::new(tracker.clone(), "session_42_abcdefghi"),
    );
    (controller, tracker)
}

#[derive(Default)]
struct RecordingUi {
    views: Mutex<Vec<TierView>>,
}

impl TierUi for RecordingUi {
    fn rebuild(&self, view: &TierView) -> Result<(), ChartyError> {
        self.views.lock().push(view.clone());
        Ok(())
    }
}

#[test]
fn test_round_trip_restores_noob_profile() {
    let (controller, _) = controller(Tier::Noob);
    let noob_config = controller.compositor().lock().config().clone();

    controller.set_tier(Tier::Viper);
    assert_eq!(controller.profile(), profile_of(Tier::Viper));
    assert!(!controller.compositor().lock().config().enabled);

    controller.set_tier(Tier::Noob);
    assert_eq!(controller.profile(), profile_of(Tier::Noob));
    assert_eq!(controller.compositor().lock().config(), &noob_config);
    assert!(!controller.profile().features.custom_branding);
    assert!(!controller.profile().features.auto_spacing);
}

#[rstest]
#[case(Tier::Noob, true, 0.4, 14.0)]
#[case(Tier::Registered, true, 0.4, 14.0)]
#[case(Tier::Viper, false, 0.2, 12.0)]
fn test_transition_pushes_watermark_settings(
    #[case] tier: Tier,
    #[case] enabled: bool,
    #[case] opacity: f32,
    #[case] size: f32,
) {
    let (controller, _) = controller(Tier::Noob);
    controller.set_tier(tier);

    let compositor = controller.compositor().lock();
    assert_eq!(compositor.config().enabled, enabled);
    assert_eq!(compositor.config().opacity, opacity);
    assert_eq!(compositor.config().size, size);
}

#[test]
fn test_ui_rebuilt_on_every_transition() {
    let ui = Arc::new(RecordingUi::default());
    let (controller, tracker) = controller(Tier::Noob);
    let controller = controller.with_ui(ui.clone());

    controller.set_tier(Tier::Registered);
    controller.set_tier(Tier::Viper);

    let tiers: Vec<Tier> = ui.views.lock().iter().map(|v| v.tier).collect();
    assert_eq!(tiers, vec![Tier::Noob, Tier::Registered, Tier::Viper]);
    assert_eq!(
        tracker.actions(),
        vec!["tier_registered".to_string(), "tier_viper".to_string()]
    );
    assert!(tracker
        .events()
        .iter()
        .all(|e| e.session_id == "session_42_abcdefghi"));
}

#[test]
fn test_readers_see_complete_transition() {
    let (controller, _) = controller(Tier::Registered);
    let handle = controller.handle();

    controller.set_tier(Tier::Viper);
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.tier, Tier::Viper);
    assert_eq!(snapshot.profile.tier, Tier::Viper);
}

#[tokio::test]
async fn test_session_id_persists_across_restarts() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("session.json");

    let first = Session::load_or_create(&FileSessionStore::new(&path), "getcharty_session_id")
        .await
        .unwrap();
    let second = Session::load_or_create(&FileSessionStore::new(&path), "getcharty_session_id")
        .await
        .unwrap();

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.id, second.id);
    assert!(first.id.starts_with("session_"));

    let raw = std::fs::read_to_string(&path).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored["getcharty_session_id"], first.id.as_str());
}

#[tokio::test]
async fn test_blank_stored_id_is_replaced() {
    let temp = TempDir::new().unwrap();
    let store = FileSessionStore::new(temp.path().join("s.json"));
    store.set("k", "  ").await.unwrap();

    let session = Session::load_or_create(&store, "k").await.unwrap();
    assert!(session.created);
    assert_eq!(store.get("k").await.unwrap(), Some(session.id));
}
