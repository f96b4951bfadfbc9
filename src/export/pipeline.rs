//! Export pipeline.
//!
//! `export_current_chart` runs the whole sequence for one export:
//!
//! 1. Check the chart display region holds rendered content
//! 2. Merge the per-call overrides into a private copy of the base config
//! 3. Check the current tier may export the effective format
//! 4. Capture the region (the only await on the path)
//! 5. Composite the watermark when the tier's profile enables it
//! 6. Encode, enforce the tier's file-size limit and deliver
//! 7. Record an `export_<format>` usage event
//!
//! Any failure aborts before delivery, so a partial file is never handed out.

use super::config::{ExportOverrides, SharedExportConfig};
use super::delivery::FileDelivery;
use super::encoder::{EncodeOptions, EncoderFactory, EncoderQuality};
use super::filename::generate_export_filename;
use super::rasterizer::{CaptureOptions, ChartSource, LazyRasterizer};
use crate::capability::{ensure_available, ExportFormat, Tier};
use crate::constants::DEFAULT_PRODUCT;
use crate::error::ChartyError;
use crate::session::{SharedCompositor, TierHandle, UsageRecorder};
use crate::watermark::WatermarkOverride;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

/// What a successful export produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportOutcome {
    pub filename: String,
    pub format: ExportFormat,
    pub tier: Tier,
    pub bytes: usize,
    pub watermarked: bool,
}

/// Orchestrates capture, watermarking, encoding and delivery.
pub struct ExportPipeline {
    product: String,
    config: SharedExportConfig,
    tier: TierHandle,
    compositor: SharedCompositor,
    rasterizer: Arc<LazyRasterizer>,
    delivery: Arc<dyn FileDelivery>,
    usage: UsageRecorder,
}

impl std::fmt::Debug for ExportPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportPipeline")
            .field("product", &self.product)
            .field("config", &self.config.snapshot())
            .field("tier", &self.tier.current())
            .field("rasterizer", &self.rasterizer)
            .finish()
    }
}

impl ExportPipeline {
    pub fn new(
        tier: TierHandle,
        compositor: SharedCompositor,
        rasterizer: Arc<LazyRasterizer>,
        delivery: Arc<dyn FileDelivery>,
        usage: UsageRecorder,
    ) -> Self {
        Self {
            product: DEFAULT_PRODUCT.to_string(),
            config: SharedExportConfig::default(),
            tier,
            compositor,
            rasterizer,
            delivery,
            usage,
        }
    }

    pub fn with_config(mut self, config: SharedExportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = product.into();
        self
    }

    /// Base export config, shared with whoever adjusts quality/scale.
    pub fn config(&self) -> &SharedExportConfig {
        &self.config
    }

    pub fn tier(&self) -> &TierHandle {
        &self.tier
    }

    /// Whether the rasterization dependency is loaded.
    pub fn is_available(&self) -> bool {
        self.rasterizer.is_loaded()
    }

    /// Load the rasterization dependency ahead of the first export.
    pub async fn initialize(&self) -> Result<(), ChartyError> {
        self.rasterizer.get().await.map(|_| ())
    }

    /// Export the chart with the base config merged with `overrides`.
    pub async fn export_current_chart(
        &self,
        chart: &dyn ChartSource,
        overrides: Option<&ExportOverrides>,
    ) -> Result<ExportOutcome, ChartyError> {
        let result = self.run(chart, overrides).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "Export failed");
        }
        result
    }

    pub async fn export_high_quality(
        &self,
        chart: &dyn ChartSource,
    ) -> Result<ExportOutcome, ChartyError> {
        self.export_current_chart(chart, Some(&ExportOverrides::high_quality()))
            .await
    }

    pub async fn export_low_quality(
        &self,
        chart: &dyn ChartSource,
    ) -> Result<ExportOutcome, ChartyError> {
        self.export_current_chart(chart, Some(&ExportOverrides::low_quality()))
            .await
    }

    /// Export without the watermark, for tiers allowed custom branding.
    pub async fn export_without_watermark(
        &self,
        chart: &dyn ChartSource,
    ) -> Result<ExportOutcome, ChartyError> {
        self.export_current_chart(chart, Some(&ExportOverrides::without_watermark()))
            .await
    }

    async fn run(
        &self,
        chart: &dyn ChartSource,
        overrides: Option<&ExportOverrides>,
    ) -> Result<ExportOutcome, ChartyError> {
        let region = chart
            .region()
            .ok_or_else(|| ChartyError::NoChart("no chart container found".to_string()))?;
        if !region.has_content() {
            return Err(ChartyError::NoChart(
                "chart region has no rendered content".to_string(),
            ));
        }

        let defaults = ExportOverrides::default();
        let overrides = overrides.unwrap_or(&defaults);
        let effective = self.config.effective(overrides);

        // Read the tier once so every step below sees the same profile
        let snapshot = self.tier.snapshot();
        ensure_available(snapshot.tier, effective.format)?;
        let features = &snapshot.profile.features;

        let mut surface = self
            .rasterizer
            .capture(
                &region,
                &CaptureOptions {
                    scale: effective.scale,
                    background: effective.background,
                },
            )
            .await?;

        let mut watermark = WatermarkOverride::for_tier(features);
        match overrides.watermark {
            Some(false) if features.custom_branding => watermark.enabled = Some(false),
            Some(false) => tracing::debug!(
                tier = snapshot.tier.as_str(),
                "Watermark removal requires custom branding, keeping tier watermark"
            ),
            Some(true) => watermark.enabled = Some(true),
            None => {}
        }

        let watermarked = if watermark.enabled == Some(true) {
            self.compositor
                .lock()
                .composite(&mut surface, Some(&watermark))?
        } else {
            false
        };

        let encoder = EncoderFactory::create(effective.format);
        let encoded = encoder.encode(
            &surface,
            &EncodeOptions {
                quality: EncoderQuality::from_export_quality(effective.quality),
                title: chart.title(),
            },
        )?;
        drop(surface);

        let max_size = snapshot.profile.limits.max_file_size_bytes();
        if encoded.len() > max_size {
            return Err(ChartyError::FileTooLarge {
                size: encoded.len(),
                max_size,
            });
        }

        let filename = generate_export_filename(
            &self.product,
            chart.title().as_deref(),
            effective.format.extension(),
            Utc::now(),
        );
        self.delivery
            .deliver(&filename, encoded.content_type, &encoded.data)
            .await?;

        self.usage
            .record(&format!("export_{}", effective.format.as_str()), snapshot.tier);

        tracing::info!(
            filename = %filename,
            format = effective.format.as_str(),
            tier = snapshot.tier.as_str(),
            bytes = encoded.len(),
            watermarked = watermarked,
            "Chart exported"
        );

        Ok(ExportOutcome {
            filename,
            format: effective.format,
            tier: snapshot.tier,
            bytes: encoded.len(),
            watermarked,
        })
    }
}
