// Export pipeline tests: gating, scoped overrides, watermarking, delivery

use async_trait::async_trait;
use charty::capability::{ExportFormat, Tier};
use charty::error::ChartyError;
use charty::export::{
    generate_export_filename, ChartRegion, CaptureOptions, DirectoryDelivery, ExportConfig,
    ExportOverrides, ExportPipeline, FileDelivery, LazyRasterizer, MemoryDelivery, Rasterizer,
    RasterizerLoader, RegionRasterizer, SharedExportConfig, StaticChart,
};
use charty::presentation::{Action, ActionOutcome, ActionRouter};
use charty::session::{RecordingTracker, TierHandle, UsageRecorder};
use charty::watermark::{GlyphFont, WatermarkCompositor, WatermarkConfig};
use chrono::{TimeZone, Utc};
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Semaphore;

struct Harness {
    pipeline: Arc<ExportPipeline>,
    delivery: Arc<MemoryDelivery>,
    tracker: Arc<RecordingTracker>,
    usage: UsageRecorder,
}

fn harness_with(tier: Tier, loader: Arc<dyn RasterizerLoader>) -> Harness {
    let delivery = Arc::new(MemoryDelivery::new());
    let tracker = Arc::new(RecordingTracker::new());
    let usage = UsageRecorder::new(tracker.clone(), "session_1_abcdefghi");
    let pipeline = ExportPipeline::new(
        TierHandle::fixed(tier),
        Arc::new(Mutex::new(WatermarkCompositor::with_font(
            WatermarkConfig::default(),
            Arc::new(GlyphFont::Bitmap),
        ))),
        Arc::new(LazyRasterizer::new(loader)),
        delivery.clone(),
        usage.clone(),
    );
    Harness {
        pipeline: Arc::new(pipeline),
        delivery,
        tracker,
        usage,
    }
}

fn harness(tier: Tier) -> Harness {
    harness_with(tier, Arc::new(CountingLoader::default()))
}

fn chart() -> StaticChart {
    StaticChart::new(
        RgbaImage::from_pixel(200, 120, Rgba([20, 60, 120, 255])),
        Some("Revenue by Region".to_string()),
    )
}

#[derive(Default)]
struct CountingLoader {
    loads: AtomicUsize,
}

#[async_trait]
impl RasterizerLoader for CountingLoader {
    async fn load(&self) -> Result<Arc<dyn Rasterizer>, ChartyError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(Arc::new(RegionRasterizer))
    }
}

struct FailingLoader;

#[async_trait]
impl RasterizerLoader for FailingLoader {
    async fn load(&self) -> Result<Arc<dyn Rasterizer>, ChartyError> {
        Err(ChartyError::Capture("rasterizer script blocked".to_string()))
    }
}

struct StalledRasterizer;

#[async_trait]
impl Rasterizer for StalledRasterizer {
    async fn capture(
        &self,
        _region: &ChartRegion,
        _options: &CaptureOptions,
    ) -> Result<RgbaImage, ChartyError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(ChartyError::Capture("unreachable".to_string()))
    }
}

struct StalledLoader;

#[async_trait]
impl RasterizerLoader for StalledLoader {
    async fn load(&self) -> Result<Arc<dyn Rasterizer>, ChartyError> {
        Ok(Arc::new(StalledRasterizer))
    }
}

/// Holds every capture until the test hands out permits.
struct GatedRasterizer {
    gate: Arc<Semaphore>,
}

#[async_trait]
impl Rasterizer for GatedRasterizer {
    async fn capture(
        &self,
        _region: &ChartRegion,
        _options: &CaptureOptions,
    ) -> Result<RgbaImage, ChartyError> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| ChartyError::Capture(e.to_string()))?;
        permit.forget();
        Ok(RgbaImage::from_pixel(160, 100, Rgba([20, 60, 120, 255])))
    }
}

struct GatedLoader {
    gate: Arc<Semaphore>,
}

#[async_trait]
impl RasterizerLoader for GatedLoader {
    async fn load(&self) -> Result<Arc<dyn Rasterizer>, ChartyError> {
        Ok(Arc::new(GatedRasterizer {
            gate: self.gate.clone(),
        }))
    }
}

#[tokio::test]
async fn test_noob_export_is_watermarked() {
    let h = harness(Tier::Noob);
    let outcome = h.pipeline.export_current_chart(&chart(), None).await.unwrap();

    assert_eq!(outcome.format, ExportFormat::Jpg);
    assert_eq!(outcome.tier, Tier::Noob);
    assert!(outcome.watermarked);
    assert!(outcome.filename.starts_with("getcharty-revenue-by-region-"));

    let files = h.delivery.files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].content_type, "image/jpeg");
    assert_eq!(&files[0].data[..2], &[0xFF, 0xD8]);
    assert_eq!(h.tracker.actions(), vec!["export_jpg".to_string()]);
}

#[tokio::test]
async fn test_viper_export_has_no_watermark() {
    let h = harness(Tier::Viper);
    let content = RgbaImage::from_pixel(80, 60, Rgba([200, 10, 10, 255]));
    let source = StaticChart::new(content.clone(), None);

    let outcome = h
        .pipeline
        .export_current_chart(
            &source,
            Some(&ExportOverrides {
                format: Some(ExportFormat::Png),
                scale: Some(1),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
    assert!(!outcome.watermarked);

    let decoded = image::load_from_memory(&h.delivery.files()[0].data)
        .unwrap()
        .to_rgba8();
    assert_eq!(decoded, content);
}

#[tokio::test]
async fn test_missing_chart_delivers_nothing() {
    for tier in Tier::ALL {
        let h = harness(tier);
        let err = h
            .pipeline
            .export_current_chart(&StaticChart::missing(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChartyError::NoChart(_)));
        assert!(h.delivery.is_empty());
        assert!(h.tracker.events().is_empty());
    }
}

#[tokio::test]
async fn test_png_at_registered_never_reaches_pipeline() {
    let loader = Arc::new(CountingLoader::default());
    let h = harness_with(Tier::Registered, loader.clone());
    let router = ActionRouter::new(h.pipeline.clone(), h.usage.clone());

    let outcome = router
        .handle(&chart(), Action::Export(ExportFormat::Png), None)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        ActionOutcome::UpgradeRequired {
            required: Tier::Viper,
            ..
        }
    ));
    assert_eq!(loader.loads.load(Ordering::SeqCst), 0);
    assert!(h.delivery.is_empty());
}

#[tokio::test]
async fn test_overrides_do_not_change_base_config() {
    let h = harness(Tier::Noob);
    let base = h.pipeline.config().snapshot();
    let overrides = ExportOverrides {
        quality: Some(1.0),
        ..Default::default()
    };

    h.pipeline
        .export_current_chart(&chart(), Some(&overrides))
        .await
        .unwrap();
    assert_eq!(h.pipeline.config().snapshot(), base);

    let _ = h
        .pipeline
        .export_current_chart(&StaticChart::missing(), Some(&overrides))
        .await;
    assert_eq!(h.pipeline.config().snapshot(), base);
}

#[tokio::test]
async fn test_interleaved_overrides_leave_base_config_intact() {
    let gate = Arc::new(Semaphore::new(0));
    let h = harness_with(Tier::Noob, Arc::new(GatedLoader { gate: gate.clone() }));
    let base = h.pipeline.config().snapshot();
    let source = chart();
    let sharp = ExportOverrides {
        quality: Some(1.0),
        ..Default::default()
    };
    let soft = ExportOverrides {
        quality: Some(0.5),
        scale: Some(1),
        ..Default::default()
    };

    // Both exports suspend in capture before either is released
    let release = async {
        tokio::task::yield_now().await;
        assert_eq!(h.pipeline.config().snapshot(), base);
        gate.add_permits(1);
        tokio::task::yield_now().await;
        assert_eq!(h.pipeline.config().snapshot(), base);
        gate.add_permits(1);
    };
    let (a, b, _) = tokio::join!(
        h.pipeline.export_current_chart(&source, Some(&sharp)),
        h.pipeline.export_current_chart(&source, Some(&soft)),
        release
    );

    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(h.delivery.len(), 2);
    assert_eq!(h.pipeline.config().snapshot(), base);
    assert_eq!(h.pipeline.config().snapshot().quality, 0.9);
}

#[tokio::test]
async fn test_concurrent_exports_share_one_rasterizer_load() {
    let loader = Arc::new(CountingLoader::default());
    let h = harness_with(Tier::Viper, loader.clone());
    let source = chart();

    let (a, b) = tokio::join!(
        h.pipeline.export_current_chart(&source, None),
        h.pipeline.export_current_chart(&source, None)
    );
    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    assert_eq!(h.delivery.len(), 2);
}

#[tokio::test]
async fn test_failed_rasterizer_load_surfaces_capture_error() {
    let h = harness_with(Tier::Noob, Arc::new(FailingLoader));
    let err = h
        .pipeline
        .export_current_chart(&chart(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ChartyError::Capture(_)));
    assert!(err.user_message().contains("Please try again"));
    assert!(h.delivery.is_empty());
    assert!(!h.pipeline.is_available());
}

#[tokio::test]
async fn test_capture_timeout() {
    let delivery = Arc::new(MemoryDelivery::new());
    let pipeline = ExportPipeline::new(
        TierHandle::fixed(Tier::Noob),
        Arc::new(Mutex::new(WatermarkCompositor::with_font(
            WatermarkConfig::default(),
            Arc::new(GlyphFont::Bitmap),
        ))),
        Arc::new(
            LazyRasterizer::new(Arc::new(StalledLoader))
                .with_timeout(Some(Duration::from_millis(50))),
        ),
        delivery.clone(),
        UsageRecorder::new(Arc::new(RecordingTracker::new()), "s"),
    );

    let err = pipeline
        .export_current_chart(&chart(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ChartyError::Capture(msg) if msg.contains("timed out")));
    assert!(delivery.is_empty());
}

#[tokio::test]
async fn test_every_permitted_format_encodes() {
    let h = harness(Tier::Viper);
    let expected = [
        (ExportFormat::Jpg, "image/jpeg"),
        (ExportFormat::Pdf, "application/pdf"),
        (ExportFormat::Html, "text/html"),
        (ExportFormat::Svg, "image/svg+xml"),
        (ExportFormat::Png, "image/png"),
    ];
    for (format, content_type) in expected {
        let outcome = h
            .pipeline
            .export_current_chart(&chart(), Some(&ExportOverrides::format(format)))
            .await
            .unwrap();
        assert!(outcome.filename.ends_with(&format!(".{}", format.extension())));
        let files = h.delivery.files();
        assert_eq!(files.last().unwrap().content_type, content_type);
    }
    assert_eq!(h.delivery.len(), 5);
}

#[tokio::test]
async fn test_directory_delivery_writes_file() {
    let temp = TempDir::new().unwrap();
    let tracker = Arc::new(RecordingTracker::new());
    let pipeline = ExportPipeline::new(
        TierHandle::fixed(Tier::Registered),
        Arc::new(Mutex::new(WatermarkCompositor::with_font(
            WatermarkConfig::default(),
            Arc::new(GlyphFont::Bitmap),
        ))),
        Arc::new(LazyRasterizer::new(Arc::new(CountingLoader::default()))),
        Arc::new(DirectoryDelivery::new(temp.path())),
        UsageRecorder::new(tracker, "s"),
    )
    .with_product("acme")
    .with_config(SharedExportConfig::new(ExportConfig {
        format: ExportFormat::Pdf,
        ..Default::default()
    }));

    let outcome = pipeline.export_current_chart(&chart(), None).await.unwrap();
    assert!(outcome.filename.starts_with("acme-revenue-by-region-"));

    let written = std::fs::read(temp.path().join(&outcome.filename)).unwrap();
    assert!(written.starts_with(b"%PDF-"));
    assert_eq!(written.len(), outcome.bytes);
}

#[tokio::test]
async fn test_delivery_rejects_traversal() {
    let temp = TempDir::new().unwrap();
    let delivery = DirectoryDelivery::new(temp.path());
    assert!(delivery
        .deliver("../escape.jpg", "image/jpeg", b"x")
        .await
        .is_err());
}

#[test]
fn test_filename_format() {
    let at = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
    assert_eq!(
        generate_export_filename("getcharty", Some("Q1: Sales & Costs!"), "jpg", at),
        "getcharty-q1-sales-costs-2024-03-05T14-07-09.jpg"
    );
    assert_eq!(
        generate_export_filename("getcharty", None, "png", at),
        "getcharty-chart-2024-03-05T14-07-09.png"
    );
}
