// Capability model tests: tier ordering, format/channel gating, feature lookup

use charty::capability::{
    ensure_available, feature_value, is_channel_available, is_format_available, profile_of,
    required_tier, required_tier_for_name, ExportFormat, FeatureValue, ShareChannel, Tier,
};
use charty::error::ChartyError;
use rstest::rstest;

#[test]
fn test_format_availability_follows_tier_order() {
    for tier in Tier::ALL {
        for format in ExportFormat::ALL {
            assert_eq!(
                is_format_available(tier, format),
                required_tier(format) <= tier,
                "{:?} at {:?}",
                format,
                tier
            );
        }
        for channel in ShareChannel::ALL {
            assert_eq!(
                is_channel_available(tier, channel),
                required_tier(channel) <= tier
            );
        }
    }
}

#[test]
fn test_baseline_capabilities_for_every_tier() {
    for tier in Tier::ALL {
        assert!(is_format_available(tier, ExportFormat::Jpg));
        assert!(is_channel_available(tier, ShareChannel::Socials));
    }
}

#[rstest]
#[case(ExportFormat::Jpg, Tier::Noob)]
#[case(ExportFormat::Pdf, Tier::Registered)]
#[case(ExportFormat::Html, Tier::Registered)]
#[case(ExportFormat::Svg, Tier::Viper)]
#[case(ExportFormat::Png, Tier::Viper)]
fn test_required_tier_per_format(#[case] format: ExportFormat, #[case] expected: Tier) {
    assert_eq!(required_tier(format), expected);
}

#[rstest]
#[case("socials", Tier::Noob)]
#[case("permalink", Tier::Registered)]
#[case("email", Tier::Viper)]
#[case("PDF", Tier::Registered)]
#[case("carrier-pigeon", Tier::Viper)]
#[case("", Tier::Viper)]
fn test_required_tier_by_name(#[case] name: &str, #[case] expected: Tier) {
    assert_eq!(required_tier_for_name(name), expected);
}

#[rstest]
#[case(Tier::Noob, "watermark", FeatureValue::Flag(true))]
#[case(Tier::Viper, "watermark", FeatureValue::Flag(false))]
#[case(Tier::Noob, "watermarkOpacity", FeatureValue::Number(0.4))]
#[case(Tier::Viper, "watermark-opacity", FeatureValue::Number(0.2))]
#[case(Tier::Registered, "watermark-size", FeatureValue::Number(14.0))]
#[case(Tier::Noob, "autoSpacing", FeatureValue::Flag(false))]
#[case(Tier::Registered, "advanced-charts", FeatureValue::Flag(true))]
#[case(Tier::Viper, "customBranding", FeatureValue::Flag(true))]
fn test_feature_values(#[case] tier: Tier, #[case] name: &str, #[case] expected: FeatureValue) {
    assert_eq!(feature_value(tier, name).unwrap(), expected);
}

#[test]
fn test_unknown_feature_is_an_error() {
    let err = feature_value(Tier::Viper, "teleport").unwrap_err();
    assert!(matches!(err, ChartyError::UnknownFeature(name) if name == "teleport"));
}

#[test]
fn test_tier_limits() {
    assert_eq!(profile_of(Tier::Noob).limits.monthly_charts, 10);
    assert_eq!(profile_of(Tier::Registered).limits.monthly_charts, 50);
    assert!(profile_of(Tier::Viper).limits.is_unlimited());
    assert_eq!(
        profile_of(Tier::Viper).limits.max_file_size_bytes(),
        25 * 1024 * 1024
    );
}

#[test]
fn test_permission_denied_names_required_tier() {
    let err = ensure_available(Tier::Registered, ExportFormat::Png).unwrap_err();
    match err {
        ChartyError::PermissionDenied {
            required, current, ..
        } => {
            assert_eq!(required, Tier::Viper);
            assert_eq!(current, Tier::Registered);
        }
        other => panic!("expected PermissionDenied, got {:?}", other),
    }
    assert!(ensure_available(Tier::Viper, ShareChannel::Email).is_ok());
}
