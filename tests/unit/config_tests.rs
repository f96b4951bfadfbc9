// Configuration loading and validation tests

use charty::capability::{ExportFormat, Tier};
use charty::config::{Config, LogFormat, TierDetectionMode};
use charty::export::{ExportConfig, ExportOverrides};
use charty::watermark::{FontWeight, WatermarkPosition};
use rstest::rstest;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

const FULL_CONFIG: &str = r##"
product: "getcharty"

export:
  format: html
  quality: 0.75
  scale: 2
  background_color: "#101820"
  output_dir: "exports"
  capture_timeout_ms: 5000

watermark:
  text: "GetCharty.com"
  color: "rgba(255, 255, 255, 0.9)"
  font_family: "Helvetica, sans-serif"
  font_weight: normal
  position: bottom-right

session:
  store_path: "/tmp/charty/session.json"
  key: "getcharty_session_id"

tier_detection:
  mode: token
  secret: "change-me"
  claim: "plan"

logging:
  level: "charty=debug"
  format: json
"##;

#[test]
fn test_full_config_loads_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(FULL_CONFIG.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.export.format, ExportFormat::Html);
    assert_eq!(config.export.capture_timeout(), Some(Duration::from_millis(5000)));
    assert_eq!(config.watermark.font_weight, FontWeight::Normal);
    assert_eq!(config.watermark.position, WatermarkPosition::BottomRight);
    assert_eq!(config.tier_detection.mode, TierDetectionMode::Token);
    assert_eq!(config.tier_detection.claim, "plan");
    assert_eq!(config.logging.format, LogFormat::Json);

    let export = config.export.to_export_config().unwrap();
    assert_eq!(export.quality, 0.75);
    assert_eq!((export.background.r, export.background.g, export.background.b), (0x10, 0x18, 0x20));

    let watermark = config.watermark.to_watermark_config().unwrap();
    assert_eq!(watermark.position, WatermarkPosition::BottomRight);
    assert_eq!(watermark.font.family, "Helvetica, sans-serif");
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(Config::from_file("/nonexistent/charty.yaml").is_err());
}

#[rstest]
#[case("export:\n  quality: 0.0\n")]
#[case("export:\n  scale: 0\n")]
#[case("export:\n  capture_timeout_ms: 0\n")]
#[case("export:\n  output_dir: \"\"\n")]
#[case("watermark:\n  color: \"#12\"\n")]
#[case("product: \"\"\n")]
#[case("tier_detection:\n  mode: token\n  secret: \"\"\n")]
fn test_invalid_values_fail_validation(#[case] yaml: &str) {
    let config = Config::from_yaml_with_env(yaml).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_unknown_enum_value_fails_to_parse() {
    assert!(Config::from_yaml_with_env("export:\n  format: gif\n").is_err());
    assert!(Config::from_yaml_with_env("tier_detection:\n  mode: oauth\n").is_err());
}

#[test]
fn test_tier_parsing() {
    assert_eq!("VIPer".parse::<Tier>().unwrap(), Tier::Viper);
    assert_eq!("registered".parse::<Tier>().unwrap(), Tier::Registered);
    assert!("gold".parse::<Tier>().is_err());
}

#[rstest]
#[case(-5.0, 0.1)]
#[case(5.0, 1.0)]
#[case(0.55, 0.55)]
fn test_quality_clamps(#[case] input: f32, #[case] stored: f32) {
    let mut config = ExportConfig::default();
    config.set_quality(input);
    assert_eq!(config.quality, stored);
}

#[rstest]
#[case(0, 1)]
#[case(99, 4)]
#[case(3, 3)]
fn test_scale_clamps(#[case] input: u32, #[case] stored: u32) {
    let mut config = ExportConfig::default();
    config.set_scale(input);
    assert_eq!(config.scale, stored);
}

#[test]
fn test_presets() {
    let base = ExportConfig::default();
    let high = base.merged(&ExportOverrides::high_quality());
    assert_eq!((high.quality, high.scale), (1.0, 3));
    let low = base.merged(&ExportOverrides::low_quality());
    assert_eq!((low.quality, low.scale), (0.7, 1));
    assert_eq!(ExportOverrides::without_watermark().watermark, Some(false));
}
