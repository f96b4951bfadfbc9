// Watermark compositing tests

use charty::capability::{profile_of, Tier};
use charty::watermark::{
    GlyphFont, OverlayHost, OverlayStyle, WatermarkCompositor, WatermarkConfig, WatermarkError,
    WatermarkOverride, WatermarkPosition, WatermarkSettings,
};
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use std::sync::Arc;

const BASE: Rgba<u8> = Rgba([30, 30, 30, 255]);

fn compositor(config: WatermarkConfig) -> WatermarkCompositor {
    WatermarkCompositor::with_font(config, Arc::new(GlyphFont::Bitmap))
}

fn surface() -> RgbaImage {
    RgbaImage::from_pixel(600, 400, BASE)
}

fn changed_pixels(image: &RgbaImage) -> Vec<(u32, u32)> {
    image
        .enumerate_pixels()
        .filter(|(_, _, p)| **p != BASE)
        .map(|(x, y, _)| (x, y))
        .collect()
}

#[test]
fn test_composite_is_deterministic_across_copies() {
    let compositor = compositor(WatermarkConfig::default());
    let mut first = surface();
    let mut second = surface();

    assert!(compositor.composite(&mut first, None).unwrap());
    assert!(compositor.composite(&mut second, None).unwrap());
    assert_eq!(first, second);
}

#[test]
fn test_composite_twice_on_same_surface_draws_twice() {
    let compositor = compositor(WatermarkConfig::default());
    let mut once = surface();
    compositor.composite(&mut once, None).unwrap();

    let mut twice = once.clone();
    compositor.composite(&mut twice, None).unwrap();
    assert_ne!(once, twice);
}

#[test]
fn test_disabled_watermark_draws_nothing() {
    let compositor = compositor(WatermarkConfig {
        enabled: false,
        ..Default::default()
    });
    let mut image = surface();
    assert!(!compositor.composite(&mut image, None).unwrap());
    assert!(changed_pixels(&image).is_empty());
}

#[test]
fn test_noob_watermark_lands_bottom_left() {
    let compositor = compositor(WatermarkConfig::default());
    let noob = WatermarkOverride::for_tier(&profile_of(Tier::Noob).features);
    assert_eq!(noob.opacity, Some(0.4));
    assert_eq!(noob.size, Some(14.0));
    assert_eq!(noob.position, Some(WatermarkPosition::BottomLeft));

    let mut image = surface();
    assert!(compositor.composite(&mut image, Some(&noob)).unwrap());

    let changed = changed_pixels(&image);
    assert!(!changed.is_empty());
    assert!(changed.iter().all(|&(x, y)| x < 300 && y > 200));
}

#[test]
fn test_viper_override_suppresses_watermark() {
    let compositor = compositor(WatermarkConfig::default());
    let viper = WatermarkOverride::for_tier(&profile_of(Tier::Viper).features);

    let mut image = surface();
    assert!(!compositor.composite(&mut image, Some(&viper)).unwrap());
    assert!(changed_pixels(&image).is_empty());
}

#[test]
fn test_override_is_not_written_back() {
    let compositor = compositor(WatermarkConfig::default());
    let before = compositor.config().clone();

    let mut image = surface();
    compositor
        .composite(
            &mut image,
            Some(&WatermarkOverride {
                opacity: Some(0.9),
                position: Some(WatermarkPosition::TopRight),
                ..Default::default()
            }),
        )
        .unwrap();
    assert_eq!(compositor.config(), &before);
}

#[test]
fn test_corner_positions_stay_in_their_quadrant() {
    for position in [
        WatermarkPosition::TopLeft,
        WatermarkPosition::TopRight,
        WatermarkPosition::BottomRight,
    ] {
        let in_quadrant = |x: u32, y: u32| match position {
            WatermarkPosition::TopLeft => x < 300 && y < 200,
            WatermarkPosition::TopRight => x >= 300 && y < 200,
            _ => x >= 300 && y >= 200,
        };
        let compositor = compositor(WatermarkConfig {
            position,
            ..Default::default()
        });
        let mut image = surface();
        compositor.composite(&mut image, None).unwrap();

        let changed = changed_pixels(&image);
        assert!(!changed.is_empty(), "{:?} drew nothing", position);
        assert!(
            changed.iter().all(|&(x, y)| in_quadrant(x, y)),
            "{:?} drew outside its quadrant",
            position
        );
    }
}

#[derive(Default)]
struct RecordingHost {
    styles: Mutex<Vec<OverlayStyle>>,
}

impl OverlayHost for RecordingHost {
    fn mount(&self, _element_id: &str) -> Result<(), WatermarkError> {
        Ok(())
    }

    fn apply(&self, style: &OverlayStyle) -> Result<(), WatermarkError> {
        self.styles.lock().push(style.clone());
        Ok(())
    }

    fn unmount(&self) {}
}

#[test]
fn test_tier_settings_restyle_live_overlay() {
    let host = Arc::new(RecordingHost::default());
    let mut compositor = compositor(WatermarkConfig::default());
    compositor.attach_overlay(host.clone()).unwrap();

    compositor
        .apply_settings(&WatermarkSettings::from(&profile_of(Tier::Viper).features))
        .unwrap();

    let style = compositor.overlay_style().unwrap();
    assert!(!style.visible);
    assert!(style.to_css().contains("display: none"));
    assert!(!host.styles.lock().is_empty());
}
