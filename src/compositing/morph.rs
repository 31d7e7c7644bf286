//! Iterated binary morphology and Gaussian feathering helpers

use image::{GrayImage, Pixel};
use imageproc::definitions::{Clamp, Image};
use imageproc::distance_transform::Norm;
use imageproc::filter::separable_filter_equal;
use imageproc::morphology::{dilate, erode};

/// Dilate `iterations` times with a disk of `radius`
pub fn dilate_n(mask: &GrayImage, radius: u8, iterations: usize) -> GrayImage {
    let mut out = mask.clone();
    for _ in 0..iterations {
        out = dilate(&out, Norm::L2, radius);
    }
    out
}

/// Erode `iterations` times with a disk of `radius`
pub fn erode_n(mask: &GrayImage, radius: u8, iterations: usize) -> GrayImage {
    let mut out = mask.clone();
    for _ in 0..iterations {
        out = erode(&out, Norm::L2, radius);
    }
    out
}

/// Closing: all dilations first, then all erosions
pub fn close_n(mask: &GrayImage, radius: u8, iterations: usize) -> GrayImage {
    erode_n(&dilate_n(mask, radius, iterations), radius, iterations)
}

/// Opening: all erosions first, then all dilations
pub fn open_n(mask: &GrayImage, radius: u8, iterations: usize) -> GrayImage {
    dilate_n(&erode_n(mask, radius, iterations), radius, iterations)
}

/// Sigma a Gaussian of odd `kernel_size` gets when no sigma is given explicitly
pub fn sigma_for_kernel(kernel_size: u32) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1-D Gaussian with exactly `kernel_size` taps
pub fn gaussian_kernel(kernel_size: u32) -> Vec<f32> {
    let sigma = sigma_for_kernel(kernel_size) as f64;
    let center = (kernel_size / 2) as f64;
    let weights: Vec<f64> = (0..kernel_size)
        .map(|i| {
            let d = i as f64 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();
    weights.iter().map(|w| (w / total) as f32).collect()
}

/// Gaussian blur with a square kernel of odd width `kernel_size`.
///
/// The width is capped to the image's shorter side so the kernel never outgrows it.
pub fn gaussian_blur_kernel<P>(image: &Image<P>, kernel_size: u32) -> Image<P>
where
    P: Pixel + 'static,
    <P as Pixel>::Subpixel: Into<f32> + Clamp<f32>,
{
    let (width, height) = image.dimensions();
    let max_size = width.min(height);
    let kernel_size = kernel_size.min(max_size);
    let kernel_size = if kernel_size % 2 == 0 {
        kernel_size.saturating_sub(1)
    } else {
        kernel_size
    };
    if kernel_size <= 1 {
        return image.clone();
    }
    separable_filter_equal(image, &gaussian_kernel(kernel_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_close_fills_small_hole() {
        let mut mask = GrayImage::from_pixel(40, 40, Luma([0]));
        for y in 5..35 {
            for x in 5..35 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        mask.put_pixel(20, 20, Luma([0]));
        mask.put_pixel(21, 20, Luma([0]));

        let closed = close_n(&mask, 3, 3);
        assert_eq!(closed.get_pixel(20, 20).0[0], 255);
        assert_eq!(closed.get_pixel(21, 20).0[0], 255);
    }

    #[test]
    fn test_open_removes_speckle() {
        let mut mask = GrayImage::from_pixel(40, 40, Luma([0]));
        mask.put_pixel(10, 10, Luma([255]));
        mask.put_pixel(11, 10, Luma([255]));

        let opened = open_n(&mask, 3, 2);
        assert!(opened.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_kernel_sigma_matches_common_sizes() {
        assert!((sigma_for_kernel(3) - 0.8).abs() < 1e-6);
        assert!((sigma_for_kernel(5) - 1.1).abs() < 1e-6);
    }

    #[test]
    fn test_gaussian_kernel_has_exact_taps() {
        for size in [3, 5, 21] {
            let kernel = gaussian_kernel(size);
            assert_eq!(kernel.len(), size as usize);
            assert!((kernel.iter().sum::<f32>() - 1.0).abs() < 1e-5);
            assert_eq!(kernel[0], kernel[size as usize - 1]);
        }
        let kernel = gaussian_kernel(5);
        assert!((kernel[2] - 0.375).abs() < 0.01);
    }

    #[test]
    fn test_blur_reach_is_bounded_by_kernel() {
        let mut mask = GrayImage::new(40, 8);
        for y in 0..8 {
            for x in 20..40 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let blurred = gaussian_blur_kernel(&mask, 3);
        assert_eq!(blurred.get_pixel(18, 4).0[0], 0);
        assert!(blurred.get_pixel(19, 4).0[0] > 0);
    }

    #[test]
    fn test_huge_kernel_is_capped_to_image() {
        let img = GrayImage::from_pixel(8, 8, Luma([90]));
        let blurred = gaussian_blur_kernel(&img, u32::MAX);
        assert_eq!(blurred.dimensions(), (8, 8));
        assert!(blurred.pixels().all(|p| p.0[0] >= 89));
    }

    #[test]
    fn test_blur_keeps_empty_mask_empty() {
        let mask = GrayImage::new(16, 16);
        let blurred = gaussian_blur_kernel(&mask, 5);
        assert!(blurred.pixels().all(|p| p.0[0] == 0));
    }
}
