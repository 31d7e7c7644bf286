use crate::compositing::stages::{blend, lighting, order, region, segment, warp};
use crate::compositing::types::{
    ColorMask, ColorThreshold, CornerSet, Image, LightingParams, Quad, QuadMask,
};
use crate::error::{GreenScreenError, Result};
use serde::Serialize;
use std::time::Instant;

/// Timing information for a single pipeline stage
#[derive(Debug, Clone, Serialize)]
pub struct StageTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Where a screenshot goes in one base image.
///
/// Built once per base image and shared read-only by every composite against it,
/// so a whole batch lands on identical corners.
#[derive(Debug, Clone)]
pub struct Placement {
    mask: ColorMask,
    corners: CornerSet,
    quad_mask: QuadMask,
}

impl Placement {
    /// Find the screen region in `base` and order its corners
    pub fn detect(base: &Image, threshold: &ColorThreshold) -> Result<Self> {
        let mask = segment::segment(base, threshold);
        let quad = region::extract_corners(&mask)?;
        Ok(Self::build(base, mask, &quad))
    }

    /// Use caller-supplied corners; the colour mask is still computed for lighting
    pub fn with_corners(base: &Image, threshold: &ColorThreshold, points: &Quad) -> Self {
        let mask = segment::segment(base, threshold);
        Self::build(base, mask, points)
    }

    /// Supplied corners when present, detection otherwise
    pub fn resolve(base: &Image, threshold: &ColorThreshold, corners: Option<&Quad>) -> Result<Self> {
        match corners {
            Some(points) => Ok(Self::with_corners(base, threshold, points)),
            None => Self::detect(base, threshold),
        }
    }

    fn build(base: &Image, mask: ColorMask, points: &Quad) -> Self {
        let corners = order::order_corners(points);
        let quad_mask = blend::quad_mask(&corners, base.width(), base.height());
        tracing::info!(corners = ?corners.to_pairs(), "Screen placement resolved");
        Self {
            mask,
            corners,
            quad_mask,
        }
    }

    pub fn corners(&self) -> &CornerSet {
        &self.corners
    }

    pub fn mask(&self) -> &ColorMask {
        &self.mask
    }

    pub fn quad_mask(&self) -> &QuadMask {
        &self.quad_mask
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.mask.dimensions()
    }
}

/// Detect and order the screen corners of `image`
pub fn detect_corners(image: &Image, threshold: &ColorThreshold) -> Result<CornerSet> {
    Placement::detect(image, threshold).map(|placement| placement.corners)
}

/// Result of compositing including timing stats
#[derive(Debug, Clone, Serialize)]
pub struct CompositeResult {
    /// Composited image (not serialized)
    #[serde(skip)]
    pub image: Image,
    /// Total compositing time in milliseconds
    pub total_time_ms: u64,
    /// Individual stage timings
    pub stages: Vec<StageTiming>,
}

/// Warps, relights and blends screenshots onto a resolved placement
pub struct Compositor {
    params: LightingParams,
}

impl Compositor {
    pub fn new(params: LightingParams) -> Self {
        Self { params }
    }

    /// Composite one screenshot onto `base` at `placement`
    pub fn apply(&self, placement: &Placement, base: &Image, screenshot: &Image) -> Result<CompositeResult> {
        if placement.dimensions() != base.dimensions() {
            return Err(GreenScreenError::InvalidRequest(format!(
                "placement is for a {:?} image but base is {:?}",
                placement.dimensions(),
                base.dimensions()
            )));
        }
        self.params.validate()?;

        let start = Instant::now();
        let mut timings = Vec::new();
        let (width, height) = base.dimensions();

        let warped = self.run_stage("warp", &mut timings, || {
            warp::warp(screenshot, &placement.corners, width, height)
        });
        let adjusted = self.run_stage("lighting", &mut timings, || {
            lighting::adjust(&warped, base, &placement.mask, &self.params)
        });
        let image = self.run_stage("blend", &mut timings, || {
            blend::composite(base, &adjusted, &placement.quad_mask)
        });

        Ok(CompositeResult {
            image,
            total_time_ms: start.elapsed().as_millis() as u64,
            stages: timings,
        })
    }

    /// Composite every decodable screenshot; failed decodes are skipped with a warning
    pub fn apply_batch<I>(&self, placement: &Placement, base: &Image, items: I) -> Result<Vec<(String, Image)>>
    where
        I: IntoIterator<Item = (String, Result<Image>)>,
    {
        let mut results = Vec::new();
        for (id, screenshot) in items {
            let screenshot = match screenshot {
                Ok(image) => image,
                Err(e) => {
                    tracing::warn!("Skipping unreadable screenshot {}: {}", id, e);
                    continue;
                }
            };

            let result = self.apply(placement, base, &screenshot)?;
            tracing::info!("Composited {} in {}ms", id, result.total_time_ms);
            results.push((id, result.image));
        }
        Ok(results)
    }

    fn run_stage<T>(&self, name: &str, timings: &mut Vec<StageTiming>, stage_fn: impl FnOnce() -> T) -> T {
        let stage_start = Instant::now();
        let result = stage_fn();
        timings.push(StageTiming {
            name: name.to_string(),
            time_ms: stage_start.elapsed().as_millis() as u64,
        });
        result
    }
}
