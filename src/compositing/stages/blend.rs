use crate::compositing::morph::gaussian_blur_kernel;
use crate::compositing::types::{CornerSet, Image, QuadMask};
use image::{GrayImage, Luma, Rgb};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point as PixelPoint;

/// Width of the Gaussian used to soften the mask edge
const FEATHER_KERNEL: u32 = 5;

/// Filled polygon of the ordered corners, 255 inside and 0 elsewhere.
///
/// Corner coordinates are truncated to whole pixels. Corners that collapse to
/// fewer than three distinct points give an empty mask.
pub fn quad_mask(corners: &CornerSet, width: u32, height: u32) -> QuadMask {
    let mut canvas = GrayImage::new(width, height);

    let mut polygon: Vec<PixelPoint<i32>> = Vec::with_capacity(4);
    for p in corners.points() {
        let vertex = PixelPoint::new(p.x as i32, p.y as i32);
        if polygon.last() != Some(&vertex) {
            polygon.push(vertex);
        }
    }
    while polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }

    if polygon.len() >= 3 {
        draw_polygon_mut(&mut canvas, &polygon, Luma([255u8]));
    }

    QuadMask::new(canvas)
}

/// Blend `warped` over `base` through a feathered copy of `quad_mask`.
///
/// `out = warped * alpha + base * (1 - alpha)` per channel, rounded to nearest.
pub fn composite(base: &Image, warped: &Image, quad_mask: &QuadMask) -> Image {
    let alpha = gaussian_blur_kernel(quad_mask.as_image(), FEATHER_KERNEL);

    Image::from_fn(base.width(), base.height(), |x, y| {
        let a = alpha.get_pixel(x, y).0[0] as f32 / 255.0;
        if a == 0.0 {
            return *base.get_pixel(x, y);
        }
        let over = warped.get_pixel(x, y).0;
        let under = base.get_pixel(x, y).0;
        let mut out = [0u8; 3];
        for c in 0..3 {
            let v = over[c] as f32 * a + under[c] as f32 * (1.0 - a);
            out[c] = v.round().clamp(0.0, 255.0) as u8;
        }
        Rgb(out)
    })
}
