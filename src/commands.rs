//! One-shot CLI commands: corner detection and file-based compositing

use crate::cli::{CompositeArgs, DetectArgs};
use crate::compositing::{detect_corners, ColorThreshold, Compositor, Placement};
use crate::imaging;
use anyhow::Context;
use serde::Serialize;
use std::path::Path;

/// Corner payload printed by `detect`
#[derive(Debug, Serialize)]
pub struct DetectOutput {
    pub corners: [[f32; 2]; 4],
    pub width: u32,
    pub height: u32,
}

pub fn run_detect(args: DetectArgs) -> anyhow::Result<DetectOutput> {
    let base = imaging::open(&args.base)?;
    let corners = detect_corners(&base, &ColorThreshold::from(args.threshold))?;

    Ok(DetectOutput {
        corners: corners.to_pairs(),
        width: base.width(),
        height: base.height(),
    })
}

/// Composite every screenshot and return the paths written
pub fn run_composite(args: CompositeArgs) -> anyhow::Result<Vec<String>> {
    let base = imaging::open(&args.base)?;
    let threshold = ColorThreshold::from(args.threshold);
    let placement = Placement::resolve(&base, &threshold, args.corners.as_ref())
        .context("Failed to place screenshot on base image")?;
    let compositor = Compositor::new(args.lighting.into());

    if let (Some(output), [screenshot]) = (&args.output, args.screenshots.as_slice()) {
        let screenshot = imaging::open(screenshot)?;
        let result = compositor.apply(&placement, &base, &screenshot)?;
        save(&result.image, output)?;
        return Ok(vec![output.display().to_string()]);
    }

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    let items = args
        .screenshots
        .iter()
        .map(|path| (path.display().to_string(), imaging::open(path)));
    let composites = compositor.apply_batch(&placement, &base, items)?;

    let mut written = Vec::with_capacity(composites.len());
    for (id, image) in composites {
        let out_path = args.output_dir.join(imaging::output_name(Path::new(&id)));
        save(&image, &out_path)?;
        written.push(out_path.display().to_string());
    }
    Ok(written)
}

fn save(image: &crate::compositing::Image, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    image
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Saved: {}", path.display());
    Ok(())
}
