//! Polygon operations.
//!
//! Polygons are ordered vertex lists; the closing edge from the last vertex
//! back to the first is implicit. A repeated closing vertex is tolerated and
//! ignored.

use super::{Vec2, EPSILON};

/// Distance within which a point counts as lying on the boundary.
pub const BOUNDARY_TOLERANCE: f64 = 1e-6;

/// Strip an explicit closing vertex (last == first).
fn ring(polygon: &[Vec2]) -> &[Vec2] {
    match polygon {
        [first, .., last] if first == last => &polygon[..polygon.len() - 1],
        _ => polygon,
    }
}

/// Iterate the edges of a polygon, including the closing edge.
pub fn edges(polygon: &[Vec2]) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
    let ring = ring(polygon);
    let n = ring.len();
    (0..if n < 2 { 0 } else { n }).map(move |i| (ring[i], ring[(i + 1) % n]))
}

/// Signed area via the shoelace formula (counter-clockwise is positive).
pub fn signed_area(polygon: &[Vec2]) -> f64 {
    let ring = ring(polygon);
    if ring.len() < 3 {
        return 0.0;
    }
    edges(ring).map(|(a, b)| a.cross(b)).sum::<f64>() * 0.5
}

/// Absolute area.
pub fn area(polygon: &[Vec2]) -> f64 {
    signed_area(polygon).abs()
}

/// Area-weighted centroid.
///
/// Degenerate (zero-area) polygons fall back to the vertex average; an empty
/// polygon has no centroid.
pub fn centroid(polygon: &[Vec2]) -> Option<Vec2> {
    let ring = ring(polygon);
    if ring.is_empty() {
        return None;
    }

    let signed = signed_area(ring);
    if signed.abs() < EPSILON {
        let sum = ring.iter().fold(Vec2::ZERO, |acc, p| acc + *p);
        return Some(sum * (1.0 / ring.len() as f64));
    }

    let (cx, cy) = edges(ring).fold((0.0, 0.0), |(cx, cy), (a, b)| {
        let w = a.cross(b);
        (cx + (a.x + b.x) * w, cy + (a.y + b.y) * w)
    });
    let k = 1.0 / (6.0 * signed);
    Some(Vec2::new(cx * k, cy * k))
}

/// Axis-aligned bounding box as `(min, max)`.
pub fn bounding_box(polygon: &[Vec2]) -> Option<(Vec2, Vec2)> {
    let first = *polygon.first()?;
    Some(polygon.iter().fold((first, first), |(min, max), p| {
        (
            Vec2::new(min.x.min(p.x), min.y.min(p.y)),
            Vec2::new(max.x.max(p.x), max.y.max(p.y)),
        )
    }))
}

/// Point containment by ray casting. Points on the boundary (within
/// [`BOUNDARY_TOLERANCE`]) are inside.
pub fn contains_point(polygon: &[Vec2], point: Vec2) -> bool {
    let ring = ring(polygon);
    if ring.len() < 3 {
        return false;
    }

    for (a, b) in edges(ring) {
        if point.distance(point.nearest_point_on_segment(a, b)) <= BOUNDARY_TOLERANCE {
            return true;
        }
    }

    let mut inside = false;
    for (a, b) in edges(ring) {
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if point.x < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

/// Orientation of `c` relative to the directed line `a -> b`:
/// 1 = left, -1 = right, 0 = collinear.
fn orientation(a: Vec2, b: Vec2, c: Vec2) -> i8 {
    let v = (b - a).cross(c - a);
    if v > EPSILON {
        1
    } else if v < -EPSILON {
        -1
    } else {
        0
    }
}

/// `p` is collinear with `a`-`b` and lies within its bounding box.
fn on_segment(a: Vec2, b: Vec2, p: Vec2) -> bool {
    p.x <= a.x.max(b.x) + EPSILON
        && p.x >= a.x.min(b.x) - EPSILON
        && p.y <= a.y.max(b.y) + EPSILON
        && p.y >= a.y.min(b.y) - EPSILON
}

/// Segment intersection test, including touching endpoints and collinear
/// overlap.
pub fn segments_intersect(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> bool {
    let o1 = orientation(p1, p2, q1);
    let o2 = orientation(p1, p2, q2);
    let o3 = orientation(q1, q2, p1);
    let o4 = orientation(q1, q2, p2);

    if o1 != o2 && o3 != o4 && o1 != 0 && o2 != 0 && o3 != 0 && o4 != 0 {
        return true;
    }

    (o1 == 0 && on_segment(p1, p2, q1))
        || (o2 == 0 && on_segment(p1, p2, q2))
        || (o3 == 0 && on_segment(q1, q2, p1))
        || (o4 == 0 && on_segment(q1, q2, p2))
}

/// True when any two non-adjacent edges intersect.
pub fn is_self_intersecting(polygon: &[Vec2]) -> bool {
    let ring = ring(polygon);
    let n = ring.len();
    if n < 4 {
        return false;
    }

    for i in 0..n {
        let (a1, a2) = (ring[i], ring[(i + 1) % n]);
        for j in (i + 2)..n {
            // The first and last edges share vertex 0.
            if i == 0 && j == n - 1 {
                continue;
            }
            let (b1, b2) = (ring[j], ring[(j + 1) % n]);
            if segments_intersect(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    false
}
