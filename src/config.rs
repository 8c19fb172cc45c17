use crate::error::PipelineError;
use crate::preprocessing::steps::contrast::ContrastMethod;
use crate::preprocessing::steps::denoise::DenoiseMethod;
use crate::preprocessing::steps::threshold::ThresholdMethod;
use crate::preprocessing::{ConditionerConfig, Geometry};
use crate::segmentation::DEFAULT_ROI_PADDING;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "ink2pixel")]
#[command(about = "Binarize handwritten page scans and extract lines, characters and regions")]
#[command(version)]
pub struct Args {
    /// Page images to process
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory receiving masks, crops, overlays and JSON reports
    #[arg(short, long, env = "INK2PIXEL_OUTPUT_DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// Contrast enhancement (clahe, histogram_eq, gamma)
    #[arg(long, env = "INK2PIXEL_CONTRAST", default_value = "clahe")]
    pub contrast: String,

    /// Exponent for the gamma contrast method
    #[arg(
        long,
        env = "INK2PIXEL_GAMMA",
        default_value = "1.2",
        allow_negative_numbers = true
    )]
    pub gamma: f32,

    /// Noise reduction (bilateral, gaussian, median)
    #[arg(long, env = "INK2PIXEL_DENOISE", default_value = "bilateral")]
    pub denoise: String,

    /// Binarization (adaptive, otsu, simple)
    #[arg(long, env = "INK2PIXEL_THRESHOLD", default_value = "adaptive")]
    pub threshold: String,

    /// Downscale or upscale pages to this width before conditioning
    #[arg(long, env = "INK2PIXEL_MAX_WIDTH")]
    pub max_width: Option<u32>,

    /// Downscale or upscale pages to this height before conditioning
    #[arg(long, env = "INK2PIXEL_MAX_HEIGHT")]
    pub max_height: Option<u32>,

    /// Fit pages into a black canvas of this size, e.g. 800x600
    #[arg(long, env = "INK2PIXEL_NORMALIZE", value_name = "WxH")]
    pub normalize: Option<String>,

    /// Padding around the text area crop, in pixels
    #[arg(long, env = "INK2PIXEL_PADDING", default_value_t = DEFAULT_ROI_PADDING)]
    pub padding: u32,

    /// Pages processed concurrently (defaults to available cores)
    #[arg(short, long, env = "INK2PIXEL_JOBS")]
    pub jobs: Option<usize>,

    /// Also write line, character and region overlays
    #[arg(long)]
    pub overlays: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

/// Validated run configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub inputs: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub conditioner: ConditionerConfig,
    pub geometry: Geometry,
    pub padding: u32,
    pub jobs: usize,
    pub overlays: bool,
}

impl Config {
    /// Configuration with default strategies for the given pages
    pub fn new(inputs: Vec<PathBuf>, output_dir: PathBuf) -> Self {
        Self {
            inputs,
            output_dir,
            conditioner: ConditionerConfig::default(),
            geometry: Geometry::default(),
            padding: DEFAULT_ROI_PADDING,
            jobs: default_jobs(),
            overlays: false,
        }
    }
}

impl TryFrom<Args> for Config {
    type Error = PipelineError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let contrast = match args.contrast.parse::<ContrastMethod>()? {
            ContrastMethod::Gamma { .. } => {
                if !(args.gamma.is_finite() && args.gamma > 0.0) {
                    return Err(PipelineError::Config(format!(
                        "gamma must be a positive number, got {}",
                        args.gamma
                    )));
                }
                ContrastMethod::Gamma { gamma: args.gamma }
            }
            other => other,
        };

        if args.max_width == Some(0) || args.max_height == Some(0) {
            return Err(PipelineError::Config(
                "resize targets must be at least 1 pixel".to_string(),
            ));
        }
        let canvas = args.normalize.as_deref().map(parse_size).transpose()?;

        if args.jobs == Some(0) {
            return Err(PipelineError::Config("jobs must be at least 1".to_string()));
        }

        Ok(Self {
            inputs: args.inputs,
            output_dir: args.output_dir,
            conditioner: ConditionerConfig {
                contrast,
                denoise: args.denoise.parse::<DenoiseMethod>()?,
                threshold: args.threshold.parse::<ThresholdMethod>()?,
            },
            geometry: Geometry {
                resize: (args.max_width, args.max_height),
                canvas,
            },
            padding: args.padding,
            jobs: args.jobs.unwrap_or_else(default_jobs),
            overlays: args.overlays,
        })
    }
}

/// Parse `WxH` into a non-zero size
fn parse_size(value: &str) -> Result<(u32, u32), PipelineError> {
    let invalid =
        || PipelineError::Config(format!("expected a size like 800x600, got '{value}'"));
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(invalid)?;
    let width: u32 = width.trim().parse().map_err(|_| invalid())?;
    let height: u32 = height.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
