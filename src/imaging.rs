//! Image decoding, encoding and the small parsers shared by the CLI and server

use crate::compositing::{Image, Point, Quad};
use crate::error::{GreenScreenError, Result};
use image::{imageops::FilterType, ImageFormat};
use std::io::Cursor;
use std::path::Path;

/// Previews wider than this are scaled down before being sent back
pub const MAX_PREVIEW_WIDTH: u32 = 1200;

/// Decode uploaded bytes into an RGB image
pub fn decode(bytes: &[u8]) -> Result<Image> {
    image::load_from_memory(bytes)
        .map(|img| img.into_rgb8())
        .map_err(|e| GreenScreenError::ImageDecodeFailure(e.to_string()))
}

/// Load an RGB image from disk
pub fn open(path: &Path) -> Result<Image> {
    image::open(path)
        .map(|img| img.into_rgb8())
        .map_err(|e| GreenScreenError::ImageDecodeFailure(format!("{}: {}", path.display(), e)))
}

pub fn encode_png(image: &Image) -> Result<Vec<u8>> {
    encode(image, ImageFormat::Png)
}

pub fn encode_jpeg(image: &Image) -> Result<Vec<u8>> {
    encode(image, ImageFormat::Jpeg)
}

fn encode(image: &Image, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, format)
        .map_err(|e| GreenScreenError::EncodeFailure(e.to_string()))?;
    Ok(buf.into_inner())
}

/// Shrink an image to at most `max_width` wide, returning it with the scale applied
pub fn resize_for_preview(image: &Image, max_width: u32) -> (Image, f32) {
    let (width, height) = image.dimensions();
    if width <= max_width {
        return (image.clone(), 1.0);
    }

    let scale = max_width as f32 / width as f32;
    let new_width = ((width as f32 * scale) as u32).max(1);
    let new_height = ((height as f32 * scale) as u32).max(1);

    (
        image::imageops::resize(image, new_width, new_height, FilterType::Triangle),
        scale,
    )
}

/// Parse four corner points.
///
/// Accepts `"x,y x,y x,y x,y"` or a JSON array of four `[x, y]` pairs.
pub fn parse_corners(text: &str) -> Result<Quad> {
    let trimmed = text.trim();
    let invalid = || GreenScreenError::InvalidCornerInput(trimmed.to_string());

    let pairs: Vec<[f32; 2]> = if trimmed.starts_with('[') {
        let raw: Vec<Vec<f32>> = serde_json::from_str(trimmed).map_err(|_| invalid())?;
        raw.into_iter()
            .map(|pair| match pair[..] {
                [x, y] => Ok([x, y]),
                _ => Err(invalid()),
            })
            .collect::<Result<_>>()?
    } else {
        trimmed
            .split_whitespace()
            .map(|part| {
                let (x, y) = part.split_once(',').ok_or_else(invalid)?;
                let x = x.trim().parse::<f32>().map_err(|_| invalid())?;
                let y = y.trim().parse::<f32>().map_err(|_| invalid())?;
                Ok([x, y])
            })
            .collect::<Result<_>>()?
    };

    match pairs[..] {
        [a, b, c, d] if pairs.iter().flatten().all(|v| v.is_finite()) => {
            Ok([a, b, c, d].map(|[x, y]| Point::new(x, y)))
        }
        _ => Err(invalid()),
    }
}

/// Parse a hue window written as `"low,high"`
pub fn parse_hue_range(text: &str) -> Result<(u8, u8)> {
    let invalid = || GreenScreenError::InvalidRequest(format!("invalid hue range: {}", text));
    let (low, high) = text.split_once(',').ok_or_else(invalid)?;
    let low = low.trim().parse::<u8>().map_err(|_| invalid())?;
    let high = high.trim().parse::<u8>().map_err(|_| invalid())?;
    Ok((low, high))
}

/// Keep only printable ASCII from a file stem, falling back to "screenshot"
pub fn sanitize_file_stem(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let safe: String = stem
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control() && *c != '"')
        .collect();
    let safe = safe.trim();
    if safe.is_empty() {
        "screenshot".to_string()
    } else {
        safe.to_string()
    }
}

/// Output file name for a composited screenshot
pub fn output_name(screenshot: &Path) -> String {
    let stem = screenshot
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("screenshot");
    format!("{}_composite.png", stem)
}
