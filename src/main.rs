use anyhow::Context;
use charty::capability::{ExportFormat, Tier};
use charty::config::Config;
use charty::export::{
    DirectoryDelivery, ExportOverrides, ExportPipeline, LazyRasterizer, RegionRasterizerLoader,
    SharedExportConfig, StaticChart,
};
use charty::presentation::{Action, ActionOutcome, ActionRouter, TierView};
use charty::session::{FileSessionStore, LogUsageTracker, Session, TierSessionController, UsageRecorder};
use charty::watermark::{default_font, GlyphFont, WatermarkCompositor};
use clap::Parser;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Charty - export charts with tier-gated formats and watermarks
#[derive(Parser, Debug)]
#[command(name = "charty")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rendered chart image used as the chart display region
    #[arg(short, long)]
    input: PathBuf,

    /// Chart title, used in the export filename
    #[arg(short, long)]
    title: Option<String>,

    /// Export format (jpg, pdf, html, svg, png)
    #[arg(short, long)]
    format: Option<String>,

    /// Force the session tier instead of detecting it
    #[arg(long)]
    tier: Option<String>,

    /// Signed tier token for token-based detection
    #[arg(long)]
    token: Option<String>,

    /// Export quality override (0.1 - 1.0)
    #[arg(long)]
    quality: Option<f32>,

    /// Capture scale override (1 - 4)
    #[arg(long)]
    scale: Option<u32>,

    /// Share through a channel (socials, permalink, email) instead of exporting
    #[arg(long, conflicts_with = "format")]
    share: Option<String>,

    /// Print the tier view as JSON and exit
    #[arg(long)]
    show_tier: bool,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    charty::logging::init_subscriber(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::info!(
        config_file = ?args.config,
        product = %config.product,
        export_format = config.export.format.as_str(),
        output_dir = %config.export.output_dir,
        "Configuration loaded successfully"
    );

    let store = FileSessionStore::new(&config.session.store_path);
    let session = Session::load_or_create(&store, &config.session.key).await?;

    let tier = match args.tier.as_deref() {
        Some(name) => name.parse::<Tier>()?,
        None => config.tier_detection.detector(args.token.clone())?.detect(),
    };

    if args.show_tier {
        println!("{}", serde_json::to_string_pretty(&TierView::for_tier(tier))?);
        return Ok(());
    }

    let font = match config.watermark.font_path.as_deref() {
        Some(path) => Arc::new(GlyphFont::resolve(Some(Path::new(path)))),
        None => default_font(),
    };
    let compositor = Arc::new(Mutex::new(WatermarkCompositor::with_font(
        config.watermark.to_watermark_config()?,
        font,
    )));

    let usage = UsageRecorder::new(Arc::new(LogUsageTracker), session.id.clone());
    let controller = TierSessionController::new(tier, compositor.clone(), usage.clone());

    let rasterizer = LazyRasterizer::new(Arc::new(RegionRasterizerLoader))
        .with_timeout(config.export.capture_timeout());
    let pipeline = ExportPipeline::new(
        controller.handle(),
        compositor,
        Arc::new(rasterizer),
        Arc::new(DirectoryDelivery::new(&config.export.output_dir)),
        usage.clone(),
    )
    .with_product(config.product.clone())
    .with_config(SharedExportConfig::new(config.export.to_export_config()?));
    let router = ActionRouter::new(Arc::new(pipeline), usage);

    let image = image::open(&args.input)
        .with_context(|| format!("Failed to read chart image {}", args.input.display()))?
        .to_rgba8();
    let chart = StaticChart::new(image, args.title.clone());

    let action = match (&args.share, &args.format) {
        (Some(channel), _) => channel.parse::<Action>()?,
        (None, Some(format)) => Action::Export(format.parse::<ExportFormat>()?),
        (None, None) => Action::Export(config.export.format),
    };
    let overrides = ExportOverrides {
        quality: args.quality,
        scale: args.scale,
        ..Default::default()
    };

    match router.handle(&chart, action, Some(&overrides)).await {
        Ok(outcome) => {
            println!("{}", outcome.message());
            if let ActionOutcome::Exported(exported) = &outcome {
                tracing::debug!(
                    session_id = %session.id,
                    filename = %exported.filename,
                    "Export complete"
                );
            }
            if matches!(outcome, ActionOutcome::UpgradeRequired { .. }) {
                std::process::exit(2);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    }
}
