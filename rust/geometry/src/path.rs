// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polyline operations for strip-like features (roads, rails, bridges)

use nalgebra::{Point2, Vector2};

/// Consecutive points closer than this are merged before smoothing
pub const PATH_MERGE_DISTANCE: f64 = 0.5;

/// Unit direction of the path at point `i`.
///
/// Interior points average the incoming and outgoing directions; end
/// points use their single segment. Degenerate input falls back to +X.
pub fn tangent(path: &[Point2<f64>], i: usize) -> Vector2<f64> {
    let n = path.len();
    let incoming = (i > 0 && i < n)
        .then(|| (path[i] - path[i - 1]).try_normalize(1e-12))
        .flatten();
    let outgoing = (i + 1 < n)
        .then(|| (path[i + 1] - path[i]).try_normalize(1e-12))
        .flatten();

    match (incoming, outgoing) {
        (Some(a), Some(b)) => (a + b).try_normalize(1e-12).unwrap_or(b),
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => Vector2::x(),
    }
}

/// Left-hand perpendicular of a direction
#[inline]
pub fn perpendicular(direction: &Vector2<f64>) -> Vector2<f64> {
    Vector2::new(-direction.y, direction.x)
}

/// Parallel path shifted `lateral` meters to the left (negative: right).
///
/// No miter correction: at sharp corners the offset is slightly short,
/// which is invisible on the narrow strips built from it.
pub fn offset_path(path: &[Point2<f64>], lateral: f64) -> Vec<Point2<f64>> {
    (0..path.len())
        .map(|i| path[i] + perpendicular(&tangent(path, i)) * lateral)
        .collect()
}

/// Drop points closer than `threshold` to the previously kept point.
/// The final endpoint is always kept.
pub fn dedup_path(path: &[Point2<f64>], threshold: f64) -> Vec<Point2<f64>> {
    let mut out: Vec<Point2<f64>> = Vec::with_capacity(path.len());
    for p in path {
        match out.last() {
            Some(last) if (p - last).norm() < threshold => {}
            _ => out.push(*p),
        }
    }

    if let (Some(end), Some(kept)) = (path.last(), out.last().copied()) {
        if kept != *end {
            if out.len() > 1 {
                out.pop();
            }
            out.push(*end);
        }
    }
    out
}

#[inline]
fn catmull_rom(
    p0: &Point2<f64>,
    p1: &Point2<f64>,
    p2: &Point2<f64>,
    p3: &Point2<f64>,
    t: f64,
) -> Point2<f64> {
    let t2 = t * t;
    let t3 = t2 * t;
    let v = (p1.coords * 2.0
        + (p2.coords - p0.coords) * t
        + (p0.coords * 2.0 - p1.coords * 5.0 + p2.coords * 4.0 - p3.coords) * t2
        + (p1.coords * 3.0 - p0.coords - p2.coords * 3.0 + p3.coords) * t3)
        * 0.5;
    Point2::from(v)
}

/// Catmull-Rom smoothing.
///
/// Near-coincident points are merged first. Each remaining segment emits
/// `subdivisions` points, followed by the final endpoint; the curve passes
/// through every kept input point. End segments use a duplicated end point
/// as the missing control point.
pub fn smooth(path: &[Point2<f64>], subdivisions: usize) -> Vec<Point2<f64>> {
    let pts = dedup_path(path, PATH_MERGE_DISTANCE);
    let n = pts.len();
    if n < 3 || subdivisions <= 1 {
        return pts;
    }

    let mut out = Vec::with_capacity((n - 1) * subdivisions + 1);
    for seg in 0..n - 1 {
        let p0 = &pts[seg.saturating_sub(1)];
        let p1 = &pts[seg];
        let p2 = &pts[seg + 1];
        let p3 = &pts[(seg + 2).min(n - 1)];
        for s in 0..subdivisions {
            let t = s as f64 / subdivisions as f64;
            out.push(catmull_rom(p0, p1, p2, p3, t));
        }
    }
    out.push(pts[n - 1]);
    out
}

/// Total length of a polyline
pub fn path_length(path: &[Point2<f64>]) -> f64 {
    path.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
}

/// Point and direction at arc length `distance` along the path (clamped)
pub fn sample_at(path: &[Point2<f64>], distance: f64) -> Option<(Point2<f64>, Vector2<f64>)> {
    let first = *path.first()?;
    if path.len() == 1 {
        return Some((first, Vector2::x()));
    }

    let mut walked = 0.0;
    for w in path.windows(2) {
        let seg = w[1] - w[0];
        let len = seg.norm();
        if len < 1e-12 {
            continue;
        }
        if walked + len >= distance {
            let t = ((distance - walked) / len).clamp(0.0, 1.0);
            return Some((w[0] + seg * t, seg / len));
        }
        walked += len;
    }

    let n = path.len();
    Some((path[n - 1], tangent(path, n - 1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn corner() -> Vec<Point2<f64>> {
        vec![Point2::new(0.0, 0.0), Point2::new(10.0, 0.0), Point2::new(10.0, 10.0)]
    }

    #[test]
    fn test_tangent_ends_and_middle() {
        let path = corner();
        assert_relative_eq!(tangent(&path, 0), Vector2::new(1.0, 0.0));
        assert_relative_eq!(tangent(&path, 2), Vector2::new(0.0, 1.0));

        let mid = tangent(&path, 1);
        let s = std::f64::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(mid, Vector2::new(s, s), epsilon = 1e-12);
    }

    #[test]
    fn test_offset_straight_path() {
        let path = vec![Point2::new(0.0, 0.0), Point2::new(5.0, 0.0)];
        let left = offset_path(&path, 2.0);
        assert_relative_eq!(left[0], Point2::new(0.0, 2.0));
        assert_relative_eq!(left[1], Point2::new(5.0, 2.0));

        let right = offset_path(&path, -1.0);
        assert_relative_eq!(right[1], Point2::new(5.0, -1.0));
    }

    #[test]
    fn test_dedup_path_keeps_endpoint() {
        let path = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.1, 0.0),
            Point2::new(3.0, 0.0),
            Point2::new(3.2, 0.0),
        ];
        let out = dedup_path(&path, PATH_MERGE_DISTANCE);
        assert_eq!(out, vec![Point2::new(0.0, 0.0), Point2::new(3.2, 0.0)]);
    }

    #[test]
    fn test_smooth_point_count_and_interpolation() {
        let path = corner();
        let smoothed = smooth(&path, 4);
        assert_eq!(smoothed.len(), 2 * 4 + 1);

        // Passes through the original points
        assert_relative_eq!(smoothed[0], path[0]);
        assert_relative_eq!(smoothed[4], path[1], epsilon = 1e-12);
        assert_relative_eq!(smoothed[8], path[2]);
    }

    #[test]
    fn test_smooth_short_path_unchanged() {
        let path = vec![Point2::new(0.0, 0.0), Point2::new(0.2, 0.0), Point2::new(8.0, 0.0)];
        assert_eq!(smooth(&path, 5), vec![Point2::new(0.0, 0.0), Point2::new(8.0, 0.0)]);
    }

    #[test]
    fn test_sample_at() {
        let path = corner();
        assert_relative_eq!(path_length(&path), 20.0);

        let (p, dir) = sample_at(&path, 15.0).unwrap();
        assert_relative_eq!(p, Point2::new(10.0, 5.0));
        assert_relative_eq!(dir, Vector2::new(0.0, 1.0));

        let (end, _) = sample_at(&path, 99.0).unwrap();
        assert_relative_eq!(end, Point2::new(10.0, 10.0));
    }
}
