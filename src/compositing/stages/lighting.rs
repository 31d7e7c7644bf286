use crate::compositing::color::{scale_saturation, LabPlanes};
use crate::compositing::morph::{dilate_n, gaussian_blur_kernel};
use crate::compositing::types::{ColorMask, Image, LightingParams};

/// 25x25 elliptical element used to grow the mask into its surroundings
const RING_RADIUS: u8 = 12;
const RING_ITERATIONS: usize = 3;
/// Rings this small say too little about the ambient light to match against
const MIN_RING_PIXELS: usize = 100;
/// Fraction of the lightness gap closed by automatic matching
const AUTO_MATCH_STRENGTH: f32 = 0.5;

/// Match the warped screenshot to the scene.
///
/// All-zero `params` select automatic matching against the band of base pixels
/// around `mask`; anything else applies the manual adjustments in a fixed order:
/// brightness, contrast, temperature (on Lab), saturation (on HSV), then blur.
pub fn adjust(warped: &Image, base: &Image, mask: &ColorMask, params: &LightingParams) -> Image {
    if params.is_automatic() {
        match_surroundings(warped, base, mask)
    } else {
        apply_manual(warped, params)
    }
}

fn match_surroundings(warped: &Image, base: &Image, mask: &ColorMask) -> Image {
    let mask_img = mask.as_image();
    let dilated = dilate_n(mask_img, RING_RADIUS, RING_ITERATIONS);

    let ring: Vec<usize> = dilated
        .pixels()
        .zip(mask_img.pixels())
        .enumerate()
        .filter_map(|(i, (d, m))| (d.0[0] > 0 && m.0[0] == 0).then_some(i))
        .collect();

    if ring.len() <= MIN_RING_PIXELS {
        tracing::debug!(ring_pixels = ring.len(), "Ring too small, skipping lighting match");
        return warped.clone();
    }

    let inside: Vec<usize> = mask_img
        .pixels()
        .enumerate()
        .filter_map(|(i, m)| (m.0[0] > 0).then_some(i))
        .collect();
    if inside.is_empty() {
        return warped.clone();
    }

    let base_lab = LabPlanes::from_image(base);
    let target_l = mean_at(&base_lab.l, &ring);

    let mut warped_lab = LabPlanes::from_image(warped);
    let current_l = mean_at(&warped_lab.l, &inside);

    let shift = (target_l - current_l) * AUTO_MATCH_STRENGTH;
    tracing::debug!(target_l, current_l, shift, "Matching lightness to surroundings");

    for l in &mut warped_lab.l {
        *l += shift;
    }
    warped_lab.clamp_lightness();
    warped_lab.to_image()
}

fn apply_manual(warped: &Image, params: &LightingParams) -> Image {
    let mut adjusted =
        if params.brightness != 0.0 || params.contrast != 0.0 || params.temperature != 0.0 {
            let mut lab = LabPlanes::from_image(warped);
            apply_brightness(&mut lab.l, params.brightness);
            apply_contrast(&mut lab.l, params.contrast);
            apply_temperature(&mut lab.b, params.temperature);
            lab.to_image()
        } else {
            warped.clone()
        };

    if params.saturation != 0.0 {
        adjusted = scale_saturation(&adjusted, (100.0 + params.saturation) / 100.0);
    }

    if params.blur_radius > 0 {
        adjusted = gaussian_blur_kernel(&adjusted, params.blur_radius.saturating_mul(2).saturating_add(1));
    }

    adjusted
}

pub fn apply_brightness(lightness: &mut [f32], brightness: f32) {
    if brightness == 0.0 {
        return;
    }
    for l in lightness {
        *l += brightness;
    }
}

/// Stretch lightness around its mean by `(100 + contrast) / 100`
pub fn apply_contrast(lightness: &mut [f32], contrast: f32) {
    if contrast == 0.0 || lightness.is_empty() {
        return;
    }
    let mean = lightness.iter().map(|&l| l as f64).sum::<f64>() / lightness.len() as f64;
    let mean = mean as f32;
    let factor = (100.0 + contrast) / 100.0;
    for l in lightness {
        *l = mean + factor * (*l - mean);
    }
}

/// Positive values push the blue-yellow axis towards yellow
pub fn apply_temperature(blue_yellow: &mut [f32], temperature: f32) {
    if temperature == 0.0 {
        return;
    }
    for b in blue_yellow {
        *b += temperature;
    }
}

fn mean_at(values: &[f32], indices: &[usize]) -> f32 {
    let sum: f64 = indices.iter().map(|&i| values[i] as f64).sum();
    (sum / indices.len() as f64) as f32
}
