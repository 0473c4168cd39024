// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Thick ribbon along a polyline: the shared shape of road surfaces,
//! sidewalks, bridge decks and railings.

use crate::error::{Error, Result};
use crate::mesh::MeshBuffer;
use crate::path::{perpendicular, tangent};
use nalgebra::{Point2, Point3};

/// Extrude a closed slab of `2 · half_width` along `path` between
/// `z_bottom` and `z_top`.
///
/// Four vertices per path point (top-left, top-right, bottom-left,
/// bottom-right). Faces: top, bottom, both sides and both end caps, all
/// wound outward. UV: u across the ribbon, v along it, in meters.
pub fn add_ribbon(
    mesh: &mut MeshBuffer,
    slot: usize,
    path: &[Point2<f64>],
    half_width: f64,
    z_bottom: f64,
    z_top: f64,
) -> Result<()> {
    let n = path.len();
    if n < 2 {
        return Err(Error::InvalidExtrusion(format!(
            "ribbon needs at least 2 points, got {}",
            n
        )));
    }
    if half_width <= 0.0 || z_top <= z_bottom {
        return Err(Error::InvalidExtrusion(format!(
            "ribbon half width {:.3}, z {:.3}..{:.3}",
            half_width, z_bottom, z_top
        )));
    }

    let width = half_width * 2.0;
    let base = mesh.vertex_count() as u32;
    let mut along = 0.0;

    for i in 0..n {
        if i > 0 {
            along += (path[i] - path[i - 1]).norm();
        }
        let normal = perpendicular(&tangent(path, i));
        let left = path[i] + normal * half_width;
        let right = path[i] - normal * half_width;

        mesh.add_vertex(Point3::new(left.x, left.y, z_top), Point2::new(0.0, along));
        mesh.add_vertex(Point3::new(right.x, right.y, z_top), Point2::new(width, along));
        mesh.add_vertex(Point3::new(left.x, left.y, z_bottom), Point2::new(0.0, along));
        mesh.add_vertex(Point3::new(right.x, right.y, z_bottom), Point2::new(width, along));
    }

    let tl = |i: usize| base + (i * 4) as u32;
    let tr = |i: usize| base + (i * 4 + 1) as u32;
    let bl = |i: usize| base + (i * 4 + 2) as u32;
    let br = |i: usize| base + (i * 4 + 3) as u32;

    for i in 0..n - 1 {
        let j = i + 1;
        // Top
        mesh.add_triangle(slot, tl(i), tr(i), tr(j));
        mesh.add_triangle(slot, tl(i), tr(j), tl(j));
        // Bottom
        mesh.add_triangle(slot, bl(i), br(j), br(i));
        mesh.add_triangle(slot, bl(i), bl(j), br(j));
        // Right side
        mesh.add_triangle(slot, tr(i), br(i), br(j));
        mesh.add_triangle(slot, tr(i), br(j), tr(j));
        // Left side
        mesh.add_triangle(slot, tl(i), bl(j), bl(i));
        mesh.add_triangle(slot, tl(i), tl(j), bl(j));
    }

    // End caps
    let last = n - 1;
    mesh.add_triangle(slot, tl(0), br(0), tr(0));
    mesh.add_triangle(slot, tl(0), bl(0), br(0));
    mesh.add_triangle(slot, tl(last), tr(last), br(last));
    mesh.add_triangle(slot, tl(last), br(last), bl(last));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use citymesh_core::FeatureClass;

    #[test]
    fn test_straight_ribbon_is_closed() {
        let mut mesh = MeshBuffer::new(FeatureClass::Road);
        let slot = mesh.slot("road");
        let path = vec![Point2::new(0.0, 0.0), Point2::new(4.0, 0.0), Point2::new(10.0, 0.0)];
        add_ribbon(&mut mesh, slot, &path, 1.0, 0.0, 0.5).unwrap();

        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.triangle_count(), 2 * 8 + 4);
        assert_relative_eq!(mesh.signed_volume(), 10.0, epsilon = 1e-4);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_bent_ribbon_faces_outward() {
        let mut mesh = MeshBuffer::new(FeatureClass::Road);
        let slot = mesh.slot("road");
        let path = vec![Point2::new(0.0, 0.0), Point2::new(10.0, 0.0), Point2::new(10.0, 10.0)];
        add_ribbon(&mut mesh, slot, &path, 1.0, 0.0, 1.0).unwrap();
        assert!(mesh.signed_volume() > 0.0);

        // First triangle is on the top face
        let tri = &mesh.submeshes[0].indices[0..3];
        let (a, b, c) = (mesh.position(tri[0]), mesh.position(tri[1]), mesh.position(tri[2]));
        assert!((b - a).cross(&(c - a)).z > 0.0);
    }

    #[test]
    fn test_rejects_degenerate_input() {
        let mut mesh = MeshBuffer::new(FeatureClass::Road);
        let slot = mesh.slot("road");
        assert!(add_ribbon(&mut mesh, slot, &[Point2::origin()], 1.0, 0.0, 1.0).is_err());
        let path = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)];
        assert!(add_ribbon(&mut mesh, slot, &path, 0.0, 0.0, 1.0).is_err());
        assert!(add_ribbon(&mut mesh, slot, &path, 1.0, 1.0, 1.0).is_err());
        assert!(mesh.is_empty());
    }
}
