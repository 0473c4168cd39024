// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar polygon utilities: winding, area, centroid, offsetting

use nalgebra::{Point2, Vector2};

/// Points closer than this are treated as the same vertex
pub const VERTEX_MERGE_EPSILON: f64 = 1e-6;

/// Shoelace signed area. Positive for counter-clockwise rings.
#[inline]
pub fn signed_area(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let p = &points[i];
        let q = &points[(i + 1) % n];
        sum += p.x * q.y - q.x * p.y;
    }
    sum * 0.5
}

/// Unsigned area
#[inline]
pub fn area(points: &[Point2<f64>]) -> f64 {
    signed_area(points).abs()
}

/// Check if a polygon is convex (all cross products have same sign)
pub fn is_convex(points: &[Point2<f64>]) -> bool {
    if points.len() < 3 {
        return false;
    }

    let n = points.len();
    let mut sign = 0i8;

    for i in 0..n {
        let p0 = &points[i];
        let p1 = &points[(i + 1) % n];
        let p2 = &points[(i + 2) % n];

        let cross = (p1.x - p0.x) * (p2.y - p1.y) - (p1.y - p0.y) * (p2.x - p1.x);

        if cross.abs() > 1e-10 {
            let current_sign = if cross > 0.0 { 1i8 } else { -1i8 };
            if sign == 0 {
                sign = current_sign;
            } else if sign != current_sign {
                return false;
            }
        }
    }

    true
}

/// Drop consecutive duplicate points and a repeated closing point
pub fn dedup_ring(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut ring: Vec<Point2<f64>> = Vec::with_capacity(points.len());
    for p in points {
        if ring
            .last()
            .map_or(true, |last| (p - last).norm() > VERTEX_MERGE_EPSILON)
        {
            ring.push(*p);
        }
    }
    while ring.len() > 1 {
        let (first, last) = (ring[0], ring[ring.len() - 1]);
        if (first - last).norm() > VERTEX_MERGE_EPSILON {
            break;
        }
        ring.pop();
    }
    ring
}

/// Prepare a ring for extrusion: dedup, require 3 points and non-zero
/// area, and wind it counter-clockwise.
pub fn normalize_ring(points: &[Point2<f64>]) -> Option<Vec<Point2<f64>>> {
    let mut ring = dedup_ring(points);
    if ring.len() < 3 {
        return None;
    }
    let a = signed_area(&ring);
    if a.abs() < 1e-9 {
        return None;
    }
    if a < 0.0 {
        ring.reverse();
    }
    Some(ring)
}

/// Area centroid, falling back to the vertex average for degenerate rings
pub fn centroid(points: &[Point2<f64>]) -> Point2<f64> {
    if points.is_empty() {
        return Point2::origin();
    }

    let n = points.len();
    let a = signed_area(points);
    if a.abs() > 1e-9 {
        let mut cx = 0.0;
        let mut cy = 0.0;
        for i in 0..n {
            let p = &points[i];
            let q = &points[(i + 1) % n];
            let cross = p.x * q.y - q.x * p.y;
            cx += (p.x + q.x) * cross;
            cy += (p.y + q.y) * cross;
        }
        return Point2::new(cx / (6.0 * a), cy / (6.0 * a));
    }

    let sum = points.iter().fold(Vector2::zeros(), |acc, p| acc + p.coords);
    Point2::from(sum / n as f64)
}

/// Shrink a ring toward its centroid.
///
/// Each vertex moves by `min(distance, 0.4 · |v − centroid|)`, so small or
/// concave shapes shrink less instead of folding over themselves.
pub fn erode(points: &[Point2<f64>], distance: f64) -> Vec<Point2<f64>> {
    let c = centroid(points);
    points
        .iter()
        .map(|p| {
            let to_center = c - p;
            let len = to_center.norm();
            if len < 1e-12 {
                return *p;
            }
            let step = distance.min(0.4 * len);
            p + to_center / len * step
        })
        .collect()
}

/// Grow a ring away from its centroid by a fixed distance per vertex
pub fn expand(points: &[Point2<f64>], distance: f64) -> Vec<Point2<f64>> {
    let c = centroid(points);
    points
        .iter()
        .map(|p| {
            let from_center = p - c;
            let len = from_center.norm();
            if len < 1e-12 {
                return *p;
            }
            p + from_center / len * distance
        })
        .collect()
}

/// Even-odd point-in-polygon test
pub fn contains_point(points: &[Point2<f64>], point: &Point2<f64>) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (&points[i], &points[j]);
        if (pi.y > point.y) != (pj.y > point.y) {
            let x = (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x;
            if point.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Axis-aligned bounding rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds2 {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

impl Bounds2 {
    /// Bounds of a point set, `None` when empty
    pub fn from_points(points: &[Point2<f64>]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Bounds2 {
            min: *first,
            max: *first,
        };
        for p in &points[1..] {
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.y = bounds.min.y.min(p.y);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.y = bounds.max.y.max(p.y);
        }
        Some(bounds)
    }

    #[inline]
    pub fn contains(&self, p: &Point2<f64>) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}
