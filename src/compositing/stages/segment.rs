use crate::compositing::color::rgb_to_hsv8;
use crate::compositing::morph::{close_n, open_n};
use crate::compositing::types::{ColorMask, ColorThreshold, Image};
use image::{GrayImage, Luma};

/// 7x7 elliptical structuring element
const KERNEL_RADIUS: u8 = 3;
const CLOSE_ITERATIONS: usize = 3;
const OPEN_ITERATIONS: usize = 2;

/// Threshold the image in HSV and clean the result.
///
/// Closing fills pinholes inside the screen, opening then drops isolated speckles.
/// An all-background mask is a valid result.
pub fn segment(image: &Image, threshold: &ColorThreshold) -> ColorMask {
    let raw = GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if threshold.contains(rgb_to_hsv8(image.get_pixel(x, y))) {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    });

    let closed = close_n(&raw, KERNEL_RADIUS, CLOSE_ITERATIONS);
    let cleaned = open_n(&closed, KERNEL_RADIUS, OPEN_ITERATIONS);

    ColorMask::new(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn green_square(size: u32, from: u32, to: u32) -> Image {
        Image::from_fn(size, size, |x, y| {
            if (from..to).contains(&x) && (from..to).contains(&y) {
                Rgb([20, 220, 30])
            } else {
                Rgb([200, 200, 200])
            }
        })
    }

    #[test]
    fn test_segment_marks_green_region() {
        let image = green_square(100, 20, 80);
        let mask = segment(&image, &ColorThreshold::default());

        assert_eq!(mask.dimensions(), (100, 100));
        assert!(mask.is_set(50, 50));
        assert!(mask.is_set(21, 50));
        assert!(!mask.is_set(5, 5));
        assert!(!mask.is_set(90, 50));
    }

    #[test]
    fn test_segment_only_outputs_binary_values() {
        let image = green_square(60, 10, 50);
        let mask = segment(&image, &ColorThreshold::default());
        assert!(mask
            .as_image()
            .pixels()
            .all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn test_segment_without_green_is_empty() {
        let image = Image::from_pixel(50, 50, Rgb([220, 30, 30]));
        let mask = segment(&image, &ColorThreshold::default());
        assert_eq!(mask.count_foreground(), 0);
    }

    #[test]
    fn test_segment_respects_custom_hue_range() {
        // Pure blue sits at hue 120 on the half-degree scale
        let image = Image::from_fn(60, 60, |x, y| {
            if (10..50).contains(&x) && (10..50).contains(&y) {
                Rgb([0, 0, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let threshold = ColorThreshold {
            hue_low: 100,
            hue_high: 130,
            ..Default::default()
        };
        let mask = segment(&image, &threshold);
        assert!(mask.is_set(30, 30));
        assert!(!segment(&image, &ColorThreshold::default()).is_set(30, 30));
    }

    #[test]
    fn test_segment_fills_pinholes() {
        let mut image = green_square(100, 20, 80);
        image.put_pixel(50, 50, Rgb([200, 200, 200]));
        image.put_pixel(51, 50, Rgb([200, 200, 200]));

        let mask = segment(&image, &ColorThreshold::default());
        assert!(mask.is_set(50, 50));
        assert!(mask.is_set(51, 50));
    }
}
