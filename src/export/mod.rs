//! Chart export.
//!
//! Captures the chart display region, applies the tier's watermark, encodes
//! the surface into the requested format and hands the bytes to a
//! [`FileDelivery`] collaborator under a product-branded filename.

pub mod config;
pub mod delivery;
pub mod encoder;
pub mod filename;
pub mod pipeline;
pub mod rasterizer;

pub use config::{ExportConfig, ExportFileConfig, ExportOverrides, SharedExportConfig};
pub use delivery::{DeliveredFile, DirectoryDelivery, FileDelivery, MemoryDelivery};
pub use encoder::{
    EncodeOptions, EncodedImage, EncoderFactory, EncoderQuality, HtmlEncoder, ImageEncoder,
    JpegEncoder, PdfEncoder, PngEncoder, SvgEncoder,
};
pub use filename::{export_timestamp, generate_export_filename, sanitize_title};
pub use pipeline::{ExportOutcome, ExportPipeline};
pub use rasterizer::{
    CaptureOptions, ChartRegion, ChartSource, LazyRasterizer, Rasterizer, RasterizerLoader,
    RegionRasterizer, RegionRasterizerLoader, StaticChart,
};
