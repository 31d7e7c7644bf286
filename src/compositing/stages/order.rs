use crate::compositing::types::{CornerSet, Point, Quad};

/// Put four points into (top-left, top-right, bottom-right, bottom-left) order.
///
/// Top-left has the smallest `x + y`, bottom-right the largest; top-right has the
/// smallest `y - x`, bottom-left the largest. Ties go to the earliest input point.
///
/// The rule assumes a roughly axis-aligned quadrilateral. Near 45° rotation, or
/// with collinear or coincident input, two roles can land on the same point; the
/// result is still deterministic but need not describe a simple quadrilateral.
pub fn order_corners(points: &Quad) -> CornerSet {
    let sum = |p: &Point| p.x + p.y;
    let diff = |p: &Point| p.y - p.x;

    let top_left = select(points, sum, |candidate, best| candidate < best);
    let bottom_right = select(points, sum, |candidate, best| candidate > best);
    let top_right = select(points, diff, |candidate, best| candidate < best);
    let bottom_left = select(points, diff, |candidate, best| candidate > best);

    CornerSet::from_ordered([top_left, top_right, bottom_right, bottom_left])
}

/// First point whose key beats every earlier one
fn select(
    points: &Quad,
    key: impl Fn(&Point) -> f32,
    better: impl Fn(f32, f32) -> bool,
) -> Point {
    let mut best = points[0];
    let mut best_key = key(&best);
    for point in &points[1..] {
        let k = key(point);
        if better(k, best_key) {
            best = *point;
            best_key = k;
        }
    }
    best
}
