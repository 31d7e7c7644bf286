use crate::compositing::types::{ColorMask, Point, Quad};
use crate::error::{GreenScreenError, Result};
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::{arc_length, convex_hull};
use imageproc::point::Point as PixelPoint;

/// Smallest enclosed area (px²) accepted as a screen region
pub const MIN_REGION_AREA: f64 = 1000.0;

/// Simplification tolerances, as fractions of the perimeter, tried in order
pub const TOLERANCE_SWEEP: [f64; 7] = [0.02, 0.03, 0.04, 0.05, 0.06, 0.08, 0.10];

/// Passes used to settle on a far-apart pair of split points for closed curves
const SPLIT_SEARCH_PASSES: usize = 3;

/// Reduce the dominant foreground region of `mask` to four corner points.
///
/// The tolerance sweep stops at the first simplification with exactly four
/// vertices. When none of them produce four, the minimum-area rectangle of
/// the region is used instead. The returned points are unordered.
pub fn extract_corners(mask: &ColorMask) -> Result<Quad> {
    let contours = find_contours::<i32>(mask.as_image());

    let mut largest: Option<(f64, &[PixelPoint<i32>])> = None;
    for contour in contours
        .iter()
        .filter(|c| c.border_type == BorderType::Outer)
    {
        let area = polygon_area(&contour.points);
        match largest {
            Some((best, _)) if best >= area => {}
            _ => largest = Some((area, &contour.points)),
        }
    }

    let (area, boundary) = largest.ok_or(GreenScreenError::NoRegionFound)?;
    if area < MIN_REGION_AREA {
        return Err(GreenScreenError::RegionTooSmall {
            area,
            minimum: MIN_REGION_AREA,
        });
    }

    let perimeter = arc_length(boundary, true);
    let curve: Vec<[f64; 2]> = boundary
        .iter()
        .map(|p| [p.x as f64, p.y as f64])
        .collect();

    for multiplier in TOLERANCE_SWEEP {
        let approx = simplify_closed(&curve, multiplier * perimeter);
        tracing::debug!(
            multiplier,
            vertices = approx.len(),
            "Polygon simplification attempt"
        );
        if let [a, b, c, d] = approx[..] {
            return Ok([a, b, c, d].map(|[x, y]| Point::new(x as f32, y as f32)));
        }
    }

    tracing::debug!(area, "No four-vertex simplification, using minimum-area rectangle");
    Ok(min_area_rectangle(boundary).map(|[x, y]| Point::new(x as f32, y as f32)))
}

/// Smallest rotated rectangle enclosing `points`, corners kept fractional.
///
/// One side of the optimal rectangle lies along a convex hull edge, so every
/// hull edge is tried as a base direction.
pub fn min_area_rectangle(points: &[PixelPoint<i32>]) -> [[f64; 2]; 4] {
    let hull: Vec<[f64; 2]> = convex_hull(points)
        .iter()
        .map(|p| [p.x as f64, p.y as f64])
        .collect();

    let mut best: Option<(f64, [[f64; 2]; 4])> = None;
    for (i, &p) in hull.iter().enumerate() {
        let q = hull[(i + 1) % hull.len()];
        let length = (q[0] - p[0]).hypot(q[1] - p[1]);
        if length == 0.0 {
            continue;
        }
        let u = [(q[0] - p[0]) / length, (q[1] - p[1]) / length];
        let v = [-u[1], u[0]];

        let (mut min_u, mut max_u) = (f64::MAX, f64::MIN);
        let (mut min_v, mut max_v) = (f64::MAX, f64::MIN);
        for h in &hull {
            let pu = h[0] * u[0] + h[1] * u[1];
            let pv = h[0] * v[0] + h[1] * v[1];
            min_u = min_u.min(pu);
            max_u = max_u.max(pu);
            min_v = min_v.min(pv);
            max_v = max_v.max(pv);
        }

        let area = (max_u - min_u) * (max_v - min_v);
        if best.as_ref().map_or(true, |(best_area, _)| area < *best_area) {
            let corner = |a: f64, b: f64| [a * u[0] + b * v[0], a * u[1] + b * v[1]];
            best = Some((
                area,
                [
                    corner(min_u, min_v),
                    corner(max_u, min_v),
                    corner(max_u, max_v),
                    corner(min_u, max_v),
                ],
            ));
        }
    }

    match best {
        Some((_, rect)) => rect,
        // Fewer than two distinct hull points: collapse onto the bounding box
        None => {
            let (min_x, max_x) = points.iter().fold((i32::MAX, i32::MIN), |(lo, hi), p| {
                (lo.min(p.x), hi.max(p.x))
            });
            let (min_y, max_y) = points.iter().fold((i32::MAX, i32::MIN), |(lo, hi), p| {
                (lo.min(p.y), hi.max(p.y))
            });
            let (x0, x1, y0, y1) = (min_x as f64, max_x as f64, min_y as f64, max_y as f64);
            [[x0, y0], [x1, y0], [x1, y1], [x0, y1]]
        }
    }
}

/// Area enclosed by a closed polygon (shoelace formula)
pub fn polygon_area(points: &[PixelPoint<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let twice_area: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();

    twice_area.abs() as f64 / 2.0
}

/// Ramer-Douglas-Peucker on a closed curve.
///
/// The curve is cut at two far-apart points, each half is simplified as an
/// open polyline, and vertices left within `epsilon` of the line through
/// their neighbours are dropped from the joined result.
pub fn simplify_closed(curve: &[[f64; 2]], epsilon: f64) -> Vec<[f64; 2]> {
    let n = curve.len();
    if n < 3 {
        return curve.to_vec();
    }

    let mut start = 0;
    let mut end = farthest_from(curve, start);
    for _ in 1..SPLIT_SEARCH_PASSES {
        let next = farthest_from(curve, end);
        if next == start {
            break;
        }
        start = end;
        end = next;
    }
    if start == end {
        return vec![curve[start]];
    }

    let first: Vec<[f64; 2]> = cyclic_slice(curve, start, end);
    let second: Vec<[f64; 2]> = cyclic_slice(curve, end, start);

    let mut joined = simplify_open(&first, epsilon);
    joined.pop();
    let mut tail = simplify_open(&second, epsilon);
    tail.pop();
    joined.extend(tail);

    drop_flat_vertices(joined, epsilon)
}

fn farthest_from(curve: &[[f64; 2]], origin: usize) -> usize {
    let [ox, oy] = curve[origin];
    let mut best = origin;
    let mut best_dist = 0.0;
    for (i, [x, y]) in curve.iter().enumerate() {
        let dist = (x - ox).powi(2) + (y - oy).powi(2);
        if dist > best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}

/// Points from `from` to `to` inclusive, wrapping past the end
fn cyclic_slice(curve: &[[f64; 2]], from: usize, to: usize) -> Vec<[f64; 2]> {
    let n = curve.len();
    let len = (to + n - from) % n + 1;
    (0..len).map(|i| curve[(from + i) % n]).collect()
}

fn simplify_open(points: &[[f64; 2]], epsilon: f64) -> Vec<[f64; 2]> {
    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;

    let mut stack = vec![(0, last)];
    while let Some((from, to)) = stack.pop() {
        if to <= from + 1 {
            continue;
        }

        let mut split = from;
        let mut max_dist = 0.0;
        for i in from + 1..to {
            let dist = distance_to_line(points[i], points[from], points[to]);
            if dist > max_dist {
                split = i;
                max_dist = dist;
            }
        }

        if max_dist > epsilon {
            keep[split] = true;
            stack.push((from, split));
            stack.push((split, to));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

fn drop_flat_vertices(mut polygon: Vec<[f64; 2]>, epsilon: f64) -> Vec<[f64; 2]> {
    let mut changed = true;
    while changed && polygon.len() > 3 {
        changed = false;
        let n = polygon.len();
        for i in 0..n {
            let prev = polygon[(i + n - 1) % n];
            let next = polygon[(i + 1) % n];
            if distance_to_line(polygon[i], prev, next) <= epsilon {
                polygon.remove(i);
                changed = true;
                break;
            }
        }
    }
    polygon
}

/// Perpendicular distance from `p` to the line through `a` and `b`
fn distance_to_line(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return ((p[0] - a[0]).powi(2) + (p[1] - a[1]).powi(2)).sqrt();
    }
    ((p[0] - a[0]) * dy - (p[1] - a[1]) * dx).abs() / len
}
