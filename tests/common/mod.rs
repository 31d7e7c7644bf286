//! Synthetic scenes shared by the integration tests

#![allow(dead_code)]

use greenscreen_compositor::compositing::Image;
use image::Rgb;

pub const SCREEN_GREEN: Rgb<u8> = Rgb([30, 200, 40]);

/// Muted, non-green backdrop with a little horizontal texture
pub fn backdrop(x: u32, _y: u32) -> Rgb<u8> {
    Rgb([90 + (x % 20) as u8, 80, 120])
}

/// An image with a green screen covering `x0..=x1`, `y0..=y1`
pub fn scene_with_screen(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> Image {
    Image::from_fn(width, height, |x, y| {
        if (x0..=x1).contains(&x) && (y0..=y1).contains(&y) {
            SCREEN_GREEN
        } else {
            backdrop(x, y)
        }
    })
}

/// An 800x600 scene whose screen is the convex quad `corners`, seen in perspective
pub fn skewed_scene(corners: [(i32, i32); 4]) -> Image {
    let mut image = Image::from_fn(800, 600, backdrop);
    let polygon = corners.map(|(x, y)| imageproc::point::Point::new(x, y));
    imageproc::drawing::draw_polygon_mut(&mut image, &polygon, SCREEN_GREEN);
    image
}

/// The 800x600 scene with a screen at (100,100)-(700,500)
pub fn standard_scene() -> Image {
    scene_with_screen(800, 600, 100, 100, 700, 500)
}

pub fn png_bytes(image: &Image) -> Vec<u8> {
    greenscreen_compositor::imaging::encode_png(image).expect("encode test image")
}
