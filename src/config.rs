use crate::cli::ServeArgs;
use crate::compositing::ColorThreshold;
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_file_size: usize,
    pub preview_width: u32,
    pub templates_path: Option<PathBuf>,
    pub threshold: ColorThreshold,
}

impl From<ServeArgs> for Config {
    fn from(args: ServeArgs) -> Self {
        Self {
            host: args.host,
            port: args.port,
            max_file_size: args.max_file_size,
            preview_width: args.preview_width,
            templates_path: args.templates,
            threshold: args.threshold.into(),
        }
    }
}
