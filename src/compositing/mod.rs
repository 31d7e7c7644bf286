//! Green screen detection and screenshot compositing
//!
//! Segment the screen colour, reduce the region to four ordered corners, warp the
//! screenshot onto them, match the scene lighting and blend through a feathered mask.

pub mod color;
pub mod morph;
pub mod pipeline;
pub mod stages;
pub mod types;

pub use pipeline::{detect_corners, CompositeResult, Compositor, Placement, StageTiming};
pub use stages::blend::{composite, quad_mask};
pub use stages::lighting::adjust;
pub use stages::order::order_corners;
pub use stages::region::extract_corners;
pub use stages::segment::segment;
pub use stages::warp::warp;
pub use types::{
    ColorMask, ColorThreshold, CornerSet, Image, LightingParams, Point, Quad, QuadMask,
    MAX_BLUR_RADIUS,
};
