//! Individual pipeline stages, in the order they run

pub mod segment;
pub mod region;
pub mod order;
pub mod warp;
pub mod lighting;
pub mod blend;
