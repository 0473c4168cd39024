// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon triangulation
//!
//! Ear clipping for simple counter-clockwise rings, with a convex-hull
//! fallback for rings that are not simple (self-intersecting outlines are
//! common in crowd-sourced map data).

use crate::error::{Error, Result};
use crate::polygon::is_convex;
use nalgebra::Point2;

/// Cross products at or below this are treated as collinear
const CONVEXITY_EPSILON: f64 = 1e-9;

/// Triangulated ring
#[derive(Debug, Clone)]
pub struct Triangulation {
    /// Vertices the indices refer to
    pub points: Vec<Point2<f64>>,
    /// Triangle indices
    pub indices: Vec<usize>,
    /// True when the result is the convex hull rather than the input ring
    pub used_hull: bool,
}

impl Triangulation {
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Simple fan triangulation for convex polygons
#[inline]
fn fan_triangulate(n: usize) -> Vec<usize> {
    let mut indices = Vec::with_capacity((n - 2) * 3);
    for i in 1..n - 1 {
        indices.push(0);
        indices.push(i);
        indices.push(i + 1);
    }
    indices
}

#[inline]
fn cross(o: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Inclusive point-in-triangle test for a counter-clockwise triangle
#[inline]
fn in_triangle(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> bool {
    cross(a, b, p) >= 0.0 && cross(b, c, p) >= 0.0 && cross(c, a, p) >= 0.0
}

/// Whether the corner at `remaining[i]` can be clipped
fn is_ear(points: &[Point2<f64>], remaining: &[usize], i: usize) -> bool {
    let m = remaining.len();
    let ia = remaining[(i + m - 1) % m];
    let ib = remaining[i];
    let ic = remaining[(i + 1) % m];
    let (a, b, c) = (&points[ia], &points[ib], &points[ic]);

    if cross(a, b, c) <= CONVEXITY_EPSILON {
        return false;
    }

    remaining.iter().all(|&j| {
        if j == ia || j == ib || j == ic {
            return true;
        }
        let p = &points[j];
        // Repeated vertices (touching rings) sit on a corner, not inside
        if p == a || p == b || p == c {
            return true;
        }
        !in_triangle(p, a, b, c)
    })
}

/// Triangulate a simple counter-clockwise polygon (no holes) by ear clipping.
///
/// Returns triangle indices into `points`. The scan gives up after `2·m`
/// consecutive corners without an ear (m = vertices left), so degenerate
/// input yields a partial result instead of looping.
pub fn triangulate(points: &[Point2<f64>]) -> Result<Vec<usize>> {
    let n = points.len();

    if n < 3 {
        return Err(Error::TriangulationError(
            "Need at least 3 points to triangulate".to_string(),
        ));
    }

    // FAST PATH: Triangle - no triangulation needed
    if n == 3 {
        return Ok(vec![0, 1, 2]);
    }

    // FAST PATH: small convex polygon - use fan triangulation
    if n <= 8 && is_convex(points) && crate::polygon::signed_area(points) > 0.0 {
        return Ok(fan_triangulate(n));
    }

    let mut remaining: Vec<usize> = (0..n).collect();
    let mut indices = Vec::with_capacity((n - 2) * 3);
    let mut i = 0;
    let mut misses = 0;

    while remaining.len() > 3 {
        let m = remaining.len();
        if misses > 2 * m {
            break;
        }
        i %= m;

        if is_ear(points, &remaining, i) {
            indices.push(remaining[(i + m - 1) % m]);
            indices.push(remaining[i]);
            indices.push(remaining[(i + 1) % m]);
            remaining.remove(i);
            misses = 0;
            // Re-test the previous corner, its neighbour just changed
            i = (i + m - 2) % (m - 1);
        } else {
            i += 1;
            misses += 1;
        }
    }

    if remaining.len() == 3 {
        indices.extend_from_slice(&remaining);
    }

    Ok(indices)
}

/// Convex hull by Andrew's monotone chain, counter-clockwise, no collinear points
pub fn convex_hull(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut sorted: Vec<Point2<f64>> = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup();

    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower: Vec<Point2<f64>> = Vec::with_capacity(sorted.len());
    for p in &sorted {
        while lower.len() >= 2 && cross(&lower[lower.len() - 2], &lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(*p);
    }

    let mut upper: Vec<Point2<f64>> = Vec::with_capacity(sorted.len());
    for p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(&upper[upper.len() - 2], &upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(*p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Triangulate a ring, falling back to its convex hull when ear clipping
/// comes back short (the ring is not simple).
///
/// The hull result covers more area than the ring but never fails, so the
/// feature is still drawn. A warning is logged when the fallback is taken.
pub fn triangulate_or_hull(points: &[Point2<f64>]) -> Result<Triangulation> {
    let n = points.len();
    let expected = n.saturating_sub(2);

    let indices = triangulate(points)?;
    if indices.len() / 3 >= expected {
        return Ok(Triangulation {
            points: points.to_vec(),
            indices,
            used_hull: false,
        });
    }

    tracing::warn!(
        vertices = n,
        triangles = indices.len() / 3,
        expected,
        "Ear clipping came back short, using convex hull"
    );

    let hull = convex_hull(points);
    if hull.len() < 3 {
        return Err(Error::TriangulationError(
            "Convex hull of ring is degenerate".to_string(),
        ));
    }
    let indices = fan_triangulate(hull.len());
    Ok(Triangulation {
        points: hull,
        indices,
        used_hull: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::{area, signed_area};
    use approx::assert_relative_eq;

    fn triangles_area(points: &[Point2<f64>], indices: &[usize]) -> f64 {
        indices
            .chunks_exact(3)
            .map(|t| signed_area(&[points[t[0]], points[t[1]], points[t[2]]]))
            .sum()
    }

    fn l_shape() -> Vec<Point2<f64>> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(6.0, 0.0),
            Point2::new(6.0, 2.0),
            Point2::new(2.0, 2.0),
            Point2::new(2.0, 6.0),
            Point2::new(0.0, 6.0),
        ]
    }

    #[test]
    fn test_triangulate_square() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];

        let indices = triangulate(&points).unwrap();

        // Square should be split into 2 triangles = 6 indices
        assert_eq!(indices.len(), 6);
    }

    #[test]
    fn test_triangulate_insufficient_points() {
        let points = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)];
        assert!(triangulate(&points).is_err());
    }

    #[test]
    fn test_concave_polygon_exact_cover() {
        let points = l_shape();
        let indices = triangulate(&points).unwrap();

        assert_eq!(indices.len() / 3, points.len() - 2);
        assert!(indices.iter().all(|&i| i < points.len()));
        // Every triangle is counter-clockwise and the areas add up exactly,
        // so there are no overlaps and no gaps
        for t in indices.chunks_exact(3) {
            assert!(signed_area(&[points[t[0]], points[t[1]], points[t[2]]]) > 0.0);
        }
        assert_relative_eq!(triangles_area(&points, &indices), area(&points), epsilon = 1e-9);
    }

    #[test]
    fn test_star_polygon() {
        // 10-point star, strongly concave
        let points: Vec<_> = (0..10)
            .map(|i| {
                let angle = i as f64 * std::f64::consts::PI / 5.0;
                let r = if i % 2 == 0 { 10.0 } else { 4.0 };
                Point2::new(r * angle.cos(), r * angle.sin())
            })
            .collect();

        let indices = triangulate(&points).unwrap();
        assert_eq!(indices.len() / 3, 8);
        assert_relative_eq!(triangles_area(&points, &indices), area(&points), epsilon = 1e-6);
    }

    #[test]
    fn test_convex_hull() {
        let mut points = l_shape();
        points.push(Point2::new(1.0, 1.0)); // interior point
        let hull = convex_hull(&points);
        assert_eq!(hull.len(), 5);
        assert!(signed_area(&hull) > 0.0);
    }

    #[test]
    fn test_self_intersecting_falls_back_to_hull() {
        // Bow-tie with a notch; ear clipping cannot finish it
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(4.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(0.0, 4.0),
        ];

        let tri = triangulate_or_hull(&points).unwrap();
        assert!(tri.used_hull);
        assert_eq!(tri.triangle_count(), tri.points.len() - 2);
        assert!(tri.indices.iter().all(|&i| i < tri.points.len()));
    }

    #[test]
    fn test_simple_ring_keeps_input() {
        let points = l_shape();
        let tri = triangulate_or_hull(&points).unwrap();
        assert!(!tri.used_hull);
        assert_eq!(tri.points.len(), points.len());
        assert_eq!(tri.triangle_count(), 4);
    }
}
