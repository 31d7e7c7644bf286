//! Colour space conversions on the 8-bit scales the stages threshold and adjust in.
//!
//! HSV hue is stored as half-degrees (0-179). Lab is stored with
//! L = L* * 255 / 100 and a/b offset by 128, so every channel lives in 0-255.

use image::{Rgb, RgbImage};
use palette::{FromColor, Hsv, Lab, Srgb};

const LAB_L_SCALE: f32 = 255.0 / 100.0;
const LAB_AB_OFFSET: f32 = 128.0;

fn to_srgb(pixel: &Rgb<u8>) -> Srgb {
    let [r, g, b] = pixel.0;
    Srgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
}

fn from_srgb(color: Srgb) -> Rgb<u8> {
    let quantize = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgb([
        quantize(color.red),
        quantize(color.green),
        quantize(color.blue),
    ])
}

/// Convert a pixel to 8-bit HSV: hue in half-degrees, saturation and value in 0-255
pub fn rgb_to_hsv8(pixel: &Rgb<u8>) -> [u8; 3] {
    let hsv = Hsv::from_color(to_srgb(pixel));
    let hue = (hsv.hue.into_positive_degrees() / 2.0).round().min(179.0);
    let saturation = (hsv.saturation * 255.0).round().clamp(0.0, 255.0);
    let value = (hsv.value * 255.0).round().clamp(0.0, 255.0);
    [hue as u8, saturation as u8, value as u8]
}

/// Scale the HSV saturation of every pixel by `factor`, clamping to the valid range
pub fn scale_saturation(image: &RgbImage, factor: f32) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let mut hsv = Hsv::from_color(to_srgb(image.get_pixel(x, y)));
        hsv.saturation = (hsv.saturation * factor).clamp(0.0, 1.0);
        from_srgb(Srgb::from_color(hsv))
    })
}

/// Planar Lab representation of an image on the 8-bit scale
#[derive(Debug, Clone)]
pub struct LabPlanes {
    pub width: u32,
    pub height: u32,
    pub l: Vec<f32>,
    pub a: Vec<f32>,
    pub b: Vec<f32>,
}

impl LabPlanes {
    pub fn from_image(image: &RgbImage) -> Self {
        let len = (image.width() * image.height()) as usize;
        let mut planes = Self {
            width: image.width(),
            height: image.height(),
            l: Vec::with_capacity(len),
            a: Vec::with_capacity(len),
            b: Vec::with_capacity(len),
        };

        for pixel in image.pixels() {
            let lab: Lab = Lab::from_color(to_srgb(pixel));
            planes.l.push(lab.l * LAB_L_SCALE);
            planes.a.push(lab.a + LAB_AB_OFFSET);
            planes.b.push(lab.b + LAB_AB_OFFSET);
        }

        planes
    }

    /// Clamp every channel to 0-255 and convert back to RGB
    pub fn to_image(&self) -> RgbImage {
        let width = self.width as usize;
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let i = y as usize * width + x as usize;
            let lab = Lab::new(
                self.l[i].clamp(0.0, 255.0) / LAB_L_SCALE,
                self.a[i].clamp(0.0, 255.0) - LAB_AB_OFFSET,
                self.b[i].clamp(0.0, 255.0) - LAB_AB_OFFSET,
            );
            from_srgb(Srgb::from_color(lab))
        })
    }

    pub fn clamp_lightness(&mut self) {
        for l in &mut self.l {
            *l = l.clamp(0.0, 255.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pure_green_hue_is_sixty() {
        let [h, s, v] = rgb_to_hsv8(&Rgb([0, 255, 0]));
        assert_eq!(h, 60);
        assert_eq!(s, 255);
        assert_eq!(v, 255);
    }

    #[test]
    fn test_gray_has_no_saturation() {
        let [_, s, v] = rgb_to_hsv8(&Rgb([128, 128, 128]));
        assert_eq!(s, 0);
        assert_eq!(v, 128);
    }

    #[test]
    fn test_lab_round_trip_is_close() {
        let image = RgbImage::from_fn(4, 4, |x, y| Rgb([(x * 60) as u8, (y * 60) as u8, 90]));
        let restored = LabPlanes::from_image(&image).to_image();
        for (a, b) in image.pixels().zip(restored.pixels()) {
            for c in 0..3 {
                assert!((a.0[c] as i32 - b.0[c] as i32).abs() <= 1);
            }
        }
    }

    #[test]
    fn test_white_lightness_is_full_scale() {
        let image = RgbImage::from_pixel(1, 1, Rgb([255, 255, 255]));
        let planes = LabPlanes::from_image(&image);
        assert!((planes.l[0] - 255.0).abs() < 0.5);
        assert!((planes.a[0] - 128.0).abs() < 0.5);
    }
}
