use crate::compositing::{ColorThreshold, LightingParams, Quad, MAX_BLUR_RADIUS};
use crate::imaging;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "greenscreen-compositor")]
#[command(about = "Detect green screens and composite screenshots onto them")]
#[command(version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Detect the screen corners of a base image and print them as JSON
    Detect(DetectArgs),
    /// Composite one or more screenshots onto a base image
    Composite(CompositeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Host address to bind to
    #[arg(long, env = "GREENSCREEN_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "GREENSCREEN_PORT", default_value = "8000")]
    pub port: u16,

    /// Maximum upload size in bytes (default: 50MB)
    #[arg(long, env = "GREENSCREEN_MAX_FILE_SIZE", default_value = "52428800")]
    pub max_file_size: usize,

    /// Previews wider than this are scaled down
    #[arg(long, env = "GREENSCREEN_PREVIEW_WIDTH", default_value_t = imaging::MAX_PREVIEW_WIDTH)]
    pub preview_width: u32,

    /// JSON template catalog served at /api/templates
    #[arg(long, env = "GREENSCREEN_TEMPLATES")]
    pub templates: Option<PathBuf>,

    #[command(flatten)]
    pub threshold: ThresholdArgs,
}

#[derive(Args, Debug, Clone)]
pub struct DetectArgs {
    /// Base image containing the green screen
    #[arg(long)]
    pub base: PathBuf,

    #[command(flatten)]
    pub threshold: ThresholdArgs,
}

#[derive(Args, Debug, Clone)]
pub struct CompositeArgs {
    /// Base image containing the green screen
    #[arg(long)]
    pub base: PathBuf,

    /// Screenshot image(s) to composite
    #[arg(long, num_args = 1.., required = true)]
    pub screenshots: Vec<PathBuf>,

    /// Output path (single screenshot mode)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Output directory (bulk mode)
    #[arg(long, default_value = "./output")]
    pub output_dir: PathBuf,

    /// Manual corners as 'x,y x,y x,y x,y' (TL TR BR BL)
    #[arg(long, value_parser = parse_corners_arg)]
    pub corners: Option<Quad>,

    #[command(flatten)]
    pub lighting: LightingArgs,

    #[command(flatten)]
    pub threshold: ThresholdArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ThresholdArgs {
    /// Screen hue range as 'low,high' on the 0-179 scale
    #[arg(long, value_parser = parse_hue_arg, default_value = "35,85")]
    pub hue_range: (u8, u8),

    /// Minimum saturation (0-255)
    #[arg(long, default_value_t = 50)]
    pub sat_min: u8,

    /// Minimum value (0-255)
    #[arg(long, default_value_t = 50)]
    pub val_min: u8,
}

impl From<ThresholdArgs> for ColorThreshold {
    fn from(args: ThresholdArgs) -> Self {
        Self {
            hue_low: args.hue_range.0,
            hue_high: args.hue_range.1,
            sat_min: args.sat_min,
            val_min: args.val_min,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct LightingArgs {
    /// Brightness adjustment (-100 to 100)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub brightness: f32,

    /// Contrast adjustment (-100 to 100)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub contrast: f32,

    /// Temperature adjustment (-50 to 50), positive is warmer
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub temperature: f32,

    /// Saturation adjustment in percent
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub saturation: f32,

    /// Gaussian blur radius in pixels
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(..=MAX_BLUR_RADIUS as i64))]
    pub blur_radius: u32,
}

impl From<LightingArgs> for LightingParams {
    fn from(args: LightingArgs) -> Self {
        Self {
            brightness: args.brightness,
            contrast: args.contrast,
            temperature: args.temperature,
            saturation: args.saturation,
            blur_radius: args.blur_radius,
        }
    }
}

fn parse_hue_arg(s: &str) -> Result<(u8, u8), String> {
    imaging::parse_hue_range(s).map_err(|e| e.to_string())
}

fn parse_corners_arg(s: &str) -> Result<Quad, String> {
    imaging::parse_corners(s).map_err(|e| e.to_string())
}
