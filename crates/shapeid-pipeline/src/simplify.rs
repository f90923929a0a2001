//! Polygon approximation of closed contours (Ramer-Douglas-Peucker).
//!
//! A closed ring has no natural endpoints, so it is split into two
//! chains at its first point and the point farthest from it. Each chain
//! is simplified with RDP, and the joined ring is then swept for
//! vertices that lie within tolerance of the segment joining their
//! neighbours. The sweep removes the split point itself when it sits on
//! a straight edge, so the vertex count does not depend on where the
//! tracer started the ring.

use crate::types::{Contour, Point};

/// Approximate a closed contour with a polygon.
///
/// Points within `tolerance` pixels of the simplified edges are
/// removed. A tolerance of 0.0 removes only exactly collinear points.
///
/// Contours with fewer than 3 points are returned unchanged. The
/// result can have fewer than 3 vertices when the contour is
/// degenerate (all points on one line, or coincident).
#[must_use = "returns the approximated polygon"]
pub fn approximate_polygon(contour: &Contour, tolerance: f64) -> Contour {
    let points = contour.points();
    if points.len() < 3 {
        return contour.clone();
    }

    let origin = points[0];
    let far = farthest_from(points, origin);
    if far == 0 {
        // Every point coincides with the first one.
        return Contour::new(vec![origin]);
    }

    // Chain A: origin -> far, walking forward.
    let chain_a = &points[..=far];
    // Chain B: far -> end of ring -> back to origin.
    let chain_b: Vec<Point> = points[far..]
        .iter()
        .copied()
        .chain(std::iter::once(origin))
        .collect();

    let kept_a = rdp_keep_mask(chain_a, tolerance);
    let kept_b = rdp_keep_mask(&chain_b, tolerance);

    // Chain A contributes origin..far; chain B contributes everything
    // after far, excluding its final point (origin again).
    let mut vertices: Vec<Point> = chain_a
        .iter()
        .zip(&kept_a)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect();
    vertices.extend(
        chain_b[1..chain_b.len() - 1]
            .iter()
            .zip(&kept_b[1..kept_b.len() - 1])
            .filter(|&(_, k)| *k)
            .map(|(&p, _)| p),
    );

    drop_flat_vertices(&mut vertices, tolerance);
    Contour::new(vertices)
}

/// Index of the point farthest from `from`. Ties go to the lowest index.
fn farthest_from(points: &[Point], from: Point) -> usize {
    let mut max_dist = 0.0;
    let mut max_idx = 0;
    for (i, &p) in points.iter().enumerate() {
        let d = p.distance_squared(from);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }
    max_idx
}

/// Run RDP over an open chain and report which points survive.
///
/// Both endpoints are always kept.
fn rdp_keep_mask(points: &[Point], tolerance: f64) -> Vec<bool> {
    let mut kept = vec![false; points.len()];
    let Some(last) = points.len().checked_sub(1) else {
        return kept;
    };
    kept[0] = true;
    kept[last] = true;
    rdp_recurse(points, 0, last, tolerance, &mut kept);
    kept
}

/// Recursive step of the Ramer-Douglas-Peucker algorithm.
///
/// Finds the point between `start` and `end` that is farthest from the
/// line segment between them. If that distance exceeds `tolerance`, the
/// point is kept and both sub-segments are processed recursively.
fn rdp_recurse(points: &[Point], start: usize, end: usize, tolerance: f64, kept: &mut [bool]) {
    if end <= start + 1 {
        return;
    }

    let mut max_dist = 0.0;
    let mut max_idx = start;

    for i in (start + 1)..end {
        let d = perpendicular_distance(points[i], points[start], points[end]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist > tolerance {
        kept[max_idx] = true;
        rdp_recurse(points, start, max_idx, tolerance, kept);
        rdp_recurse(points, max_idx, end, tolerance, kept);
    }
}

/// Repeatedly remove ring vertices lying within `tolerance` of the
/// segment joining their two neighbours, never going below 3 vertices.
fn drop_flat_vertices(vertices: &mut Vec<Point>, tolerance: f64) {
    let mut changed = true;
    while changed && vertices.len() > 3 {
        changed = false;
        let mut i = 0;
        while i < vertices.len() && vertices.len() > 3 {
            let n = vertices.len();
            let prev = vertices[(i + n - 1) % n];
            let next = vertices[(i + 1) % n];
            if perpendicular_distance(vertices[i], prev, next) <= tolerance {
                vertices.remove(i);
                changed = true;
            } else {
                i += 1;
            }
        }
    }
}

/// Perpendicular distance from point `p` to the line defined by `a` and `b`.
///
/// Uses the formula: |cross(b-a, p-a)| / |b-a|.
/// When `a` and `b` coincide, returns the distance from `p` to `a`.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx.mul_add(dx, dy * dy);

    if length_sq == 0.0 {
        return p.distance(a);
    }

    let cross = dx.mul_add(a.y - p.y, -(dy * (a.x - p.x)));
    cross.abs() / length_sq.sqrt()
}
