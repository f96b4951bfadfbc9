//! Chart capture.
//!
//! Capturing the chart display region is the only suspension point of an
//! export. The rasterizer itself is an external dependency that is loaded
//! on first use; [`LazyRasterizer`] loads it at most once and hands every
//! concurrent first caller the same in-flight load.
//!
//! A failed load is not memoized: the next export starts a fresh load.

use crate::error::ChartyError;
use crate::watermark::Color;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Rendered state of the chart display region.
#[derive(Debug, Clone)]
pub struct ChartRegion {
    /// Rendered width of the region in CSS pixels
    pub width: u32,
    /// Rendered height of the region in CSS pixels
    pub height: u32,
    /// Pixels of the rendered chart, `None` while nothing is drawn
    pub content: Option<Arc<RgbaImage>>,
}

impl ChartRegion {
    pub fn new(content: RgbaImage) -> Self {
        Self {
            width: content.width(),
            height: content.height(),
            content: Some(Arc::new(content)),
        }
    }

    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            content: None,
        }
    }

    pub fn has_content(&self) -> bool {
        self.width > 0 && self.height > 0 && self.content.is_some()
    }
}

/// Collaborator that owns chart rendering.
pub trait ChartSource: Send + Sync {
    /// Current chart display region, `None` if it does not exist.
    fn region(&self) -> Option<ChartRegion>;

    fn title(&self) -> Option<String> {
        None
    }
}

/// Chart source over a fixed image, as used by the CLI.
#[derive(Debug, Clone)]
pub struct StaticChart {
    region: Option<ChartRegion>,
    title: Option<String>,
}

impl StaticChart {
    pub fn new(content: RgbaImage, title: Option<String>) -> Self {
        Self {
            region: Some(ChartRegion::new(content)),
            title,
        }
    }

    /// A page without a chart display region.
    pub fn missing() -> Self {
        Self {
            region: None,
            title: None,
        }
    }

    /// A display region that has not rendered anything yet.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            region: Some(ChartRegion::empty(width, height)),
            title: None,
        }
    }
}

impl ChartSource for StaticChart {
    fn region(&self) -> Option<ChartRegion> {
        self.region.clone()
    }

    fn title(&self) -> Option<String> {
        self.title.clone()
    }
}

/// Capture parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureOptions {
    /// Magnification applied to the region's rendered size
    pub scale: u32,
    pub background: Color,
}

/// Captures a chart region into a raster surface.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn capture(
        &self,
        region: &ChartRegion,
        options: &CaptureOptions,
    ) -> Result<RgbaImage, ChartyError>;
}

/// Loads the rasterization dependency.
#[async_trait]
pub trait RasterizerLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn Rasterizer>, ChartyError>;
}

type LoadFuture = Shared<BoxFuture<'static, Result<Arc<dyn Rasterizer>, ChartyError>>>;

/// Load-once handle around a [`RasterizerLoader`].
pub struct LazyRasterizer {
    loader: Arc<dyn RasterizerLoader>,
    in_flight: Mutex<Option<LoadFuture>>,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for LazyRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyRasterizer")
            .field("loaded", &self.is_loaded())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl LazyRasterizer {
    pub fn new(loader: Arc<dyn RasterizerLoader>) -> Self {
        Self {
            loader,
            in_flight: Mutex::new(None),
            timeout: None,
        }
    }

    /// Bound load plus capture by `timeout`. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether a load has completed successfully.
    pub fn is_loaded(&self) -> bool {
        self.in_flight
            .lock()
            .as_ref()
            .and_then(|f| f.peek())
            .map_or(false, |r| r.is_ok())
    }

    /// Get the rasterizer, starting the load if nobody has yet.
    pub async fn get(&self) -> Result<Arc<dyn Rasterizer>, ChartyError> {
        let load = {
            let mut slot = self.in_flight.lock();
            match slot.as_ref() {
                Some(load) => load.clone(),
                None => {
                    let loader = Arc::clone(&self.loader);
                    let load = async move {
                        let result = loader.load().await;
                        match &result {
                            Ok(_) => tracing::info!("Rasterizer loaded"),
                            Err(e) => tracing::error!(error = %e, "Failed to load rasterizer"),
                        }
                        result
                    }
                    .boxed()
                    .shared();
                    *slot = Some(load.clone());
                    load
                }
            }
        };

        let result = load.clone().await;
        if result.is_err() {
            let mut slot = self.in_flight.lock();
            if slot.as_ref().map_or(false, |current| current.ptr_eq(&load)) {
                *slot = None;
            }
        }
        result
    }

    /// Load the rasterizer if needed, then capture the region.
    pub async fn capture(
        &self,
        region: &ChartRegion,
        options: &CaptureOptions,
    ) -> Result<RgbaImage, ChartyError> {
        let work = async {
            let rasterizer = self.get().await?;
            rasterizer.capture(region, options).await
        };

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, work).await.map_err(|_| {
                ChartyError::Capture(format!("capture timed out after {}ms", limit.as_millis()))
            })?,
            None => work.await,
        }
    }
}

/// Rasterizer that scales the region's rendered pixels and flattens them
/// onto the background color.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegionRasterizer;

#[async_trait]
impl Rasterizer for RegionRasterizer {
    async fn capture(
        &self,
        region: &ChartRegion,
        options: &CaptureOptions,
    ) -> Result<RgbaImage, ChartyError> {
        let content = region
            .content
            .clone()
            .ok_or_else(|| ChartyError::Capture("chart region has no rendered content".to_string()))?;

        let width = region.width.saturating_mul(options.scale.max(1));
        let height = region.height.saturating_mul(options.scale.max(1));
        if width == 0 || height == 0 {
            return Err(ChartyError::Capture("chart region has zero size".to_string()));
        }

        let background = options.background;
        tokio::task::spawn_blocking(move || render_region(&content, width, height, background))
            .await
            .map_err(|e| ChartyError::Capture(format!("capture task failed: {}", e)))
    }
}

fn render_region(content: &RgbaImage, width: u32, height: u32, background: Color) -> RgbaImage {
    let scaled = if content.dimensions() == (width, height) {
        content.clone()
    } else {
        imageops::resize(content, width, height, FilterType::Triangle)
    };

    let bg = Rgba([background.r, background.g, background.b, 255]);
    let mut surface = RgbaImage::from_pixel(width, height, bg);
    for (x, y, pixel) in scaled.enumerate_pixels() {
        let alpha = pixel[3] as f32 / 255.0;
        let mix = |fg: u8, bg: u8| (fg as f32 * alpha + bg as f32 * (1.0 - alpha)).round() as u8;
        surface.put_pixel(
            x,
            y,
            Rgba([
                mix(pixel[0], bg[0]),
                mix(pixel[1], bg[1]),
                mix(pixel[2], bg[2]),
                255,
            ]),
        );
    }
    surface
}

/// Loader for the built-in [`RegionRasterizer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RegionRasterizerLoader;

#[async_trait]
impl RasterizerLoader for RegionRasterizerLoader {
    async fn load(&self) -> Result<Arc<dyn Rasterizer>, ChartyError> {
        Ok(Arc::new(RegionRasterizer))
    }
}
