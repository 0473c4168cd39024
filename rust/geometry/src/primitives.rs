// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Closed primitive solids: tapered cylinder, cone, ellipsoid

use crate::mesh::MeshBuffer;
use nalgebra::{Point2, Point3, Vector3};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

fn circle(segments: usize) -> impl Iterator<Item = (f64, f64)> {
    (0..segments).map(move |i| {
        let theta = TAU * i as f64 / segments as f64;
        (theta.cos(), theta.sin())
    })
}

/// Tapered cylinder standing on `base`, capped at both ends
pub fn add_cylinder(
    mesh: &mut MeshBuffer,
    slot: usize,
    base: Point3<f64>,
    radius_bottom: f64,
    radius_top: f64,
    height: f64,
    segments: usize,
) {
    let segments = segments.max(3);
    let top_z = base.z + height;

    let bottom_center = mesh.add_vertex(base, Point2::new(0.5, 0.5));
    let top_center = mesh.add_vertex(Point3::new(base.x, base.y, top_z), Point2::new(0.5, 0.5));

    let first = mesh.vertex_count() as u32;
    for (i, (c, s)) in circle(segments).enumerate() {
        let u = i as f64 / segments as f64;
        mesh.add_vertex(
            Point3::new(base.x + c * radius_bottom, base.y + s * radius_bottom, base.z),
            Point2::new(u, 0.0),
        );
        mesh.add_vertex(
            Point3::new(base.x + c * radius_top, base.y + s * radius_top, top_z),
            Point2::new(u, 1.0),
        );
    }

    let n = segments as u32;
    for i in 0..n {
        let j = (i + 1) % n;
        let (b0, t0) = (first + i * 2, first + i * 2 + 1);
        let (b1, t1) = (first + j * 2, first + j * 2 + 1);
        mesh.add_quad(slot, b0, b1, t1, t0);
        mesh.add_triangle(slot, top_center, t0, t1);
        mesh.add_triangle(slot, bottom_center, b1, b0);
    }
}

/// Cone standing on `base` with a closed base disk
pub fn add_cone(mesh: &mut MeshBuffer, slot: usize, base: Point3<f64>, radius: f64, height: f64, segments: usize) {
    let segments = segments.max(3);
    let center = mesh.add_vertex(base, Point2::new(0.5, 0.5));
    let apex = mesh.add_vertex(Point3::new(base.x, base.y, base.z + height), Point2::new(0.5, 1.0));

    let first = mesh.vertex_count() as u32;
    for (i, (c, s)) in circle(segments).enumerate() {
        mesh.add_vertex(
            Point3::new(base.x + c * radius, base.y + s * radius, base.z),
            Point2::new(i as f64 / segments as f64, 0.0),
        );
    }

    let n = segments as u32;
    for i in 0..n {
        let a = first + i;
        let b = first + (i + 1) % n;
        mesh.add_triangle(slot, a, b, apex);
        mesh.add_triangle(slot, center, b, a);
    }
}

/// Ellipsoid around `center` with per-axis radii (a sphere when equal)
pub fn add_ellipsoid(
    mesh: &mut MeshBuffer,
    slot: usize,
    center: Point3<f64>,
    radii: Vector3<f64>,
    rings: usize,
    segments: usize,
) {
    let rings = rings.max(2);
    let segments = segments.max(3);
    let first = mesh.vertex_count() as u32;

    // Grid with a duplicated seam column so UVs wrap cleanly
    for j in 0..=rings {
        let phi = -FRAC_PI_2 + PI * j as f64 / rings as f64;
        let (sp, cp) = phi.sin_cos();
        for i in 0..=segments {
            let theta = TAU * i as f64 / segments as f64;
            let (st, ct) = theta.sin_cos();
            mesh.add_vertex(
                Point3::new(
                    center.x + radii.x * cp * ct,
                    center.y + radii.y * cp * st,
                    center.z + radii.z * sp,
                ),
                Point2::new(i as f64 / segments as f64, j as f64 / rings as f64),
            );
        }
    }

    let row = segments as u32 + 1;
    for j in 0..rings as u32 {
        for i in 0..segments as u32 {
            let a = first + j * row + i;
            let b = a + 1;
            let c = a + row + 1;
            let d = a + row;
            // Pole rows collapse to a point, keep only the non-degenerate half
            if j > 0 {
                mesh.add_triangle(slot, a, b, c);
            }
            if j + 1 < rings as u32 {
                mesh.add_triangle(slot, a, c, d);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use citymesh_core::FeatureClass;

    #[test]
    fn test_cylinder_volume() {
        let mut mesh = MeshBuffer::new(FeatureClass::Tree);
        let slot = mesh.slot("trunk");
        add_cylinder(&mut mesh, slot, Point3::new(5.0, 5.0, 0.0), 1.0, 1.0, 2.0, 64);

        assert_eq!(mesh.triangle_count(), 64 * 4);
        // Close to pi r^2 h for a fine polygon
        assert_relative_eq!(mesh.signed_volume(), PI * 2.0, max_relative = 0.01);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_cone_volume() {
        let mut mesh = MeshBuffer::new(FeatureClass::Tree);
        let slot = mesh.slot("foliage");
        add_cone(&mut mesh, slot, Point3::origin(), 2.0, 3.0, 64);
        assert_relative_eq!(mesh.signed_volume(), PI * 4.0 * 3.0 / 3.0, max_relative = 0.01);
    }

    #[test]
    fn test_ellipsoid_volume() {
        let mut mesh = MeshBuffer::new(FeatureClass::Tree);
        let slot = mesh.slot("foliage");
        add_ellipsoid(&mut mesh, slot, Point3::new(0.0, 0.0, 4.0), Vector3::new(2.0, 2.0, 1.0), 32, 64);

        let expected = 4.0 / 3.0 * PI * 2.0 * 2.0 * 1.0;
        assert_relative_eq!(mesh.signed_volume(), expected, max_relative = 0.02);
        let (min, max) = mesh.bounds();
        assert_relative_eq!(min.z, 3.0, epsilon = 1e-5);
        assert_relative_eq!(max.z, 5.0, epsilon = 1e-5);
    }
}
