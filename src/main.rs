use anyhow::Context;
use clap::Parser;
use ocr_preprocess::config::{Binarization, PipelineConfig, DEFAULT_RESIZE_WIDTH};
use ocr_preprocess::Pipeline;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "ocr-preprocess")]
#[command(about = "Prepare document photographs for OCR")]
#[command(version)]
pub struct Args {
    /// Image to preprocess (any format the image crate decodes)
    pub input: PathBuf,

    /// Where to write the processed image; format follows the extension
    #[arg(short, long)]
    pub output: PathBuf,

    /// JSON configuration bundle; explicit flags take precedence
    #[arg(long, env = "PREP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Contrast level (0-100, 50 = unchanged)
    #[arg(long, env = "PREP_CONTRAST")]
    pub contrast: Option<u8>,

    /// Sharpness level (0-100, 50 = unchanged)
    #[arg(long, env = "PREP_SHARPNESS")]
    pub sharpness: Option<u8>,

    /// Binarization mode (simple, adaptive)
    #[arg(long, env = "PREP_BINARIZATION")]
    pub binarization: Option<Binarization>,

    /// Target width in pixels; 0 keeps the original size (default: 1600)
    #[arg(long, env = "PREP_RESIZE_WIDTH")]
    pub resize_width: Option<u32>,

    /// Write step timings as JSON to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Save the output of every step into this directory
    #[arg(long)]
    pub debug_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ocr-preprocess v{}", env!("CARGO_PKG_VERSION"));

    let config = pipeline_config(&args)?;
    let pipeline = Pipeline::new(config)?;
    tracing::debug!(
        "Steps {:?}, {} binarization, resize width {:?}",
        pipeline.step_names(),
        pipeline.config().binarization,
        pipeline.config().target_width()
    );

    let image = image::open(&args.input)
        .with_context(|| format!("Failed to load image {}", args.input.display()))?;
    tracing::info!(
        "Loaded {} ({}x{})",
        args.input.display(),
        image.width(),
        image.height()
    );

    let result = match &args.debug_dir {
        Some(dir) => {
            let (result, intermediates) = pipeline.process_with_intermediates(&image)?;
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            for (index, step) in intermediates.iter().enumerate() {
                let path = dir.join(format!("{:02}_{}.png", index + 1, step.name));
                save(&step.image, &path)?;
            }
            result
        }
        None => pipeline.process(&image)?,
    };

    save(&result.image, &args.output)?;
    tracing::info!("Wrote {}", args.output.display());

    if let Some(report) = &args.report {
        let json = serde_json::to_string_pretty(&result)?;
        fs::write(report, json)
            .with_context(|| format!("Failed to write report {}", report.display()))?;
    }

    Ok(())
}

/// Merge the config file (if any) with explicit flags
fn pipeline_config(args: &Args) -> anyhow::Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            PipelineConfig::from_json(&json)?
        }
        None => PipelineConfig {
            resize_width: Some(DEFAULT_RESIZE_WIDTH),
            ..Default::default()
        },
    };

    if let Some(contrast) = args.contrast {
        config.contrast = contrast;
    }
    if let Some(sharpness) = args.sharpness {
        config.sharpness = sharpness;
    }
    if let Some(binarization) = args.binarization {
        config.binarization = binarization;
    }
    if let Some(width) = args.resize_width {
        config.resize_width = Some(width);
    }

    Ok(config)
}

fn save(image: &image::RgbImage, path: &Path) -> anyhow::Result<()> {
    image
        .save(path)
        .with_context(|| format!("Failed to save {}", path.display()))
}
