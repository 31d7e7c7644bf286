//! Value types shared by the compositing stages

use crate::error::{GreenScreenError, Result};
use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};

/// Largest accepted manual blur radius in pixels
pub const MAX_BLUR_RADIUS: u32 = 200;

/// Three 8-bit channels in RGB order
pub type Image = RgbImage;

/// A location in image pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Four points of a quadrilateral in no particular order
pub type Quad = [Point; 4];

/// Four corners in canonical (top-left, top-right, bottom-right, bottom-left) order.
///
/// Only the corner orderer builds these, so every `CornerSet` downstream of it is
/// already canonical.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerSet([Point; 4]);

impl CornerSet {
    pub(crate) fn from_ordered(points: [Point; 4]) -> Self {
        Self(points)
    }

    pub fn points(&self) -> &[Point; 4] {
        &self.0
    }

    pub fn top_left(&self) -> Point {
        self.0[0]
    }

    pub fn top_right(&self) -> Point {
        self.0[1]
    }

    pub fn bottom_right(&self) -> Point {
        self.0[2]
    }

    pub fn bottom_left(&self) -> Point {
        self.0[3]
    }

    /// Corners as `[x, y]` pairs, the shape used for JSON payloads
    pub fn to_pairs(&self) -> [[f32; 2]; 4] {
        self.0.map(|p| [p.x, p.y])
    }
}

/// Binary mask of screen-coloured pixels (0 or 255), produced by the segmenter
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMask(GrayImage);

impl ColorMask {
    pub fn new(mask: GrayImage) -> Self {
        Self(mask)
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.0
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.0.get_pixel(x, y).0[0] > 0
    }

    pub fn count_foreground(&self) -> usize {
        self.0.pixels().filter(|p| p.0[0] > 0).count()
    }
}

/// Filled polygon of the ordered corners (0 or 255), used only for blending
#[derive(Debug, Clone, PartialEq)]
pub struct QuadMask(GrayImage);

impl QuadMask {
    pub fn new(mask: GrayImage) -> Self {
        Self(mask)
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.0
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }
}

/// HSV window that counts as "screen coloured".
///
/// Hue uses the half-degree 8-bit encoding (0-179); saturation and value use 0-255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorThreshold {
    pub hue_low: u8,
    pub hue_high: u8,
    pub sat_min: u8,
    pub val_min: u8,
}

impl Default for ColorThreshold {
    fn default() -> Self {
        Self {
            hue_low: 35,
            hue_high: 85,
            sat_min: 50,
            val_min: 50,
        }
    }
}

impl ColorThreshold {
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        let [h, s, v] = hsv;
        (self.hue_low..=self.hue_high).contains(&h) && s >= self.sat_min && v >= self.val_min
    }
}

/// Manual lighting adjustments. All zero selects automatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingParams {
    pub brightness: f32,
    pub contrast: f32,
    pub temperature: f32,
    pub saturation: f32,
    pub blur_radius: u32,
}

impl LightingParams {
    pub fn is_automatic(&self) -> bool {
        self.brightness == 0.0
            && self.contrast == 0.0
            && self.temperature == 0.0
            && self.saturation == 0.0
            && self.blur_radius == 0
    }

    /// Reject adjustments that would make the blur kernel unbounded
    pub fn validate(&self) -> Result<()> {
        if self.blur_radius > MAX_BLUR_RADIUS {
            return Err(GreenScreenError::InvalidRequest(format!(
                "blur_radius must be at most {}, got {}",
                MAX_BLUR_RADIUS, self.blur_radius
            )));
        }
        Ok(())
    }
}
