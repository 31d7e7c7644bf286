use crate::compositing::types::{CornerSet, Image, Point};
use image::Rgb;
use nalgebra::{Matrix3, SMatrix, SVector, Vector3};

const EPS: f64 = 1e-12;
/// Below this |det| the transform collapses the source and cannot be inverted
const MIN_DETERMINANT: f64 = 1e-9;

/// Projective transform taking each `src[i]` onto `dst[i]`.
///
/// Solves the 8x8 system from the four correspondences with h33 fixed at 1.
/// Returns `None` when the points are degenerate.
pub fn homography(src: &[Point; 4], dst: &[Point; 4]) -> Option<Matrix3<f64>> {
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for (i, (s, d)) in src.iter().zip(dst.iter()).enumerate() {
        let (x, y) = (s.x as f64, s.y as f64);
        let (u, v) = (d.x as f64, d.y as f64);
        let r = 2 * i;

        a[(r, 0)] = x;
        a[(r, 1)] = y;
        a[(r, 2)] = 1.0;
        a[(r, 6)] = -x * u;
        a[(r, 7)] = -y * u;
        b[r] = u;

        a[(r + 1, 3)] = x;
        a[(r + 1, 4)] = y;
        a[(r + 1, 5)] = 1.0;
        a[(r + 1, 6)] = -x * v;
        a[(r + 1, 7)] = -y * v;
        b[r + 1] = v;
    }

    let h = a.lu().solve(&b)?;
    if h.iter().any(|c| !c.is_finite()) {
        return None;
    }

    Some(Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0))
}

/// Map the whole of `source` onto `dest_corners` on a black canvas of the given size.
///
/// Each output pixel is pulled back through the inverse homography and sampled
/// bilinearly. Degenerate corners give an all-black canvas.
pub fn warp(source: &Image, dest_corners: &CornerSet, output_width: u32, output_height: u32) -> Image {
    let (w, h) = (source.width() as f32, source.height() as f32);
    let src = [
        Point::new(0.0, 0.0),
        Point::new(w, 0.0),
        Point::new(w, h),
        Point::new(0.0, h),
    ];

    if quad_area(dest_corners.points()) <= EPS {
        tracing::warn!(
            corners = ?dest_corners.to_pairs(),
            "Destination corners enclose no area, producing an empty warp"
        );
        return Image::new(output_width, output_height);
    }

    let inverse = homography(&src, dest_corners.points())
        .filter(|m| m.determinant().abs() > MIN_DETERMINANT)
        .and_then(|m| m.try_inverse());
    let Some(inverse) = inverse else {
        tracing::warn!(
            corners = ?dest_corners.to_pairs(),
            "Degenerate destination corners, producing an empty warp"
        );
        return Image::new(output_width, output_height);
    };

    Image::from_fn(output_width, output_height, |x, y| {
        let p = inverse * Vector3::new(x as f64, y as f64, 1.0);
        if p[2].abs() <= EPS {
            return Rgb([0, 0, 0]);
        }
        sample_bilinear(source, p[0] / p[2], p[1] / p[2])
    })
}

fn quad_area(points: &[Point; 4]) -> f64 {
    let twice: f64 = (0..4)
        .map(|i| {
            let (a, b) = (points[i], points[(i + 1) % 4]);
            a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64
        })
        .sum();
    twice.abs() / 2.0
}

/// Bilinear sample where taps outside the image read as black
fn sample_bilinear(image: &Image, sx: f64, sy: f64) -> Rgb<u8> {
    let (w, h) = (image.width() as f64, image.height() as f64);
    if !sx.is_finite() || !sy.is_finite() || sx <= -1.0 || sy <= -1.0 || sx >= w || sy >= h {
        return Rgb([0, 0, 0]);
    }

    let x0 = sx.floor();
    let y0 = sy.floor();
    let fx = sx - x0;
    let fy = sy - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let tap = |x: i64, y: i64| -> [f64; 3] {
        if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
            return [0.0; 3];
        }
        image.get_pixel(x as u32, y as u32).0.map(|c| c as f64)
    };

    let top_left = tap(x0, y0);
    let top_right = tap(x0 + 1, y0);
    let bottom_left = tap(x0, y0 + 1);
    let bottom_right = tap(x0 + 1, y0 + 1);

    let mut out = [0u8; 3];
    for c in 0..3 {
        let top = top_left[c] * (1.0 - fx) + top_right[c] * fx;
        let bottom = bottom_left[c] * (1.0 - fx) + bottom_right[c] * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgb(out)
}
