// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extrusion operations - converting planar rings to 3D surfaces
//!
//! All functions expect counter-clockwise rings (positive signed area) and
//! emit outward-facing triangles with Z up.

use crate::error::{Error, Result};
use crate::mesh::MeshBuffer;
use crate::triangulation::{triangulate_or_hull, Triangulation};
use nalgebra::{Point2, Point3, Vector2};

/// Which way a horizontal surface faces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Up,
    Down,
}

/// Vertical walls along a ring between `z_bottom` and `z_top`, facing outward.
///
/// Each edge gets its own four vertices so walls stay flat-shaded. U runs
/// along the perimeter in meters, V is the height.
pub fn add_side_walls(
    mesh: &mut MeshBuffer,
    slot: usize,
    boundary: &[Point2<f64>],
    z_bottom: f64,
    z_top: f64,
) {
    add_walls(mesh, slot, boundary, z_bottom, z_top, false);
}

/// Vertical walls facing into the ring (reversed winding), e.g. the inner
/// face of a parapet
pub fn add_inner_walls(
    mesh: &mut MeshBuffer,
    slot: usize,
    boundary: &[Point2<f64>],
    z_bottom: f64,
    z_top: f64,
) {
    add_walls(mesh, slot, boundary, z_bottom, z_top, true);
}

fn add_walls(
    mesh: &mut MeshBuffer,
    slot: usize,
    boundary: &[Point2<f64>],
    z_bottom: f64,
    z_top: f64,
    inward: bool,
) {
    let n = boundary.len();
    let mut u = 0.0;

    for i in 0..n {
        let p0 = &boundary[i];
        let p1 = &boundary[(i + 1) % n];

        // Skip degenerate edge (duplicate points in ring)
        let len = (p1 - p0).norm();
        if len < 1e-10 {
            continue;
        }

        let v0 = mesh.add_vertex(Point3::new(p0.x, p0.y, z_bottom), Point2::new(u, z_bottom));
        let v1 = mesh.add_vertex(Point3::new(p1.x, p1.y, z_bottom), Point2::new(u + len, z_bottom));
        let v2 = mesh.add_vertex(Point3::new(p1.x, p1.y, z_top), Point2::new(u + len, z_top));
        let v3 = mesh.add_vertex(Point3::new(p0.x, p0.y, z_top), Point2::new(u, z_top));

        if inward {
            mesh.add_triangle(slot, v0, v2, v1);
            mesh.add_triangle(slot, v0, v3, v2);
        } else {
            mesh.add_triangle(slot, v0, v1, v2);
            mesh.add_triangle(slot, v0, v2, v3);
        }

        u += len;
    }
}

/// Create a cap (top or bottom) from a triangulation at height `z`
pub fn add_cap(mesh: &mut MeshBuffer, slot: usize, triangulation: &Triangulation, z: f64, facing: Facing) {
    let base = mesh.vertex_count() as u32;

    for point in &triangulation.points {
        mesh.add_vertex(Point3::new(point.x, point.y, z), *point);
    }

    for tri in triangulation.indices.chunks_exact(3) {
        let i0 = base + tri[0] as u32;
        let i1 = base + tri[1] as u32;
        let i2 = base + tri[2] as u32;

        // Reverse winding for caps that face down
        match facing {
            Facing::Up => mesh.add_triangle(slot, i0, i1, i2),
            Facing::Down => mesh.add_triangle(slot, i0, i2, i1),
        }
    }
}

/// Horizontal strip between an outer ring and an inner ring of the same
/// vertex count, at height `z`. Used for ledge tops, cornice undersides
/// and parapet caps.
pub fn add_ring_strip(
    mesh: &mut MeshBuffer,
    slot: usize,
    outer: &[Point2<f64>],
    inner: &[Point2<f64>],
    z: f64,
    facing: Facing,
) {
    debug_assert_eq!(outer.len(), inner.len());
    let n = outer.len().min(inner.len());

    for i in 0..n {
        let j = (i + 1) % n;
        let a = mesh.add_vertex(Point3::new(outer[i].x, outer[i].y, z), outer[i]);
        let b = mesh.add_vertex(Point3::new(outer[j].x, outer[j].y, z), outer[j]);
        let c = mesh.add_vertex(Point3::new(inner[j].x, inner[j].y, z), inner[j]);
        let d = mesh.add_vertex(Point3::new(inner[i].x, inner[i].y, z), inner[i]);

        match facing {
            Facing::Up => mesh.add_quad(slot, a, b, c, d),
            Facing::Down => mesh.add_quad(slot, a, d, c, b),
        }
    }
}

/// Slots used by a closed prism
#[derive(Debug, Clone, Copy)]
pub struct PrismSlots {
    pub wall: usize,
    pub top: Option<usize>,
    pub bottom: Option<usize>,
}

impl PrismSlots {
    /// Everything in one slot, both caps present
    pub fn single(slot: usize) -> Self {
        Self {
            wall: slot,
            top: Some(slot),
            bottom: Some(slot),
        }
    }
}

/// Extrude a ring between two heights.
///
/// With both caps present the result is a closed solid. Returns the cap
/// triangulation so callers can reuse it.
pub fn extrude_prism(
    mesh: &mut MeshBuffer,
    slots: PrismSlots,
    ring: &[Point2<f64>],
    z_bottom: f64,
    z_top: f64,
) -> Result<Triangulation> {
    if z_top <= z_bottom {
        return Err(Error::InvalidExtrusion(format!(
            "top {:.3} is not above bottom {:.3}",
            z_top, z_bottom
        )));
    }

    let triangulation = triangulate_or_hull(ring)?;

    if let Some(bottom) = slots.bottom {
        add_cap(mesh, bottom, &triangulation, z_bottom, Facing::Down);
    }
    if let Some(top) = slots.top {
        add_cap(mesh, top, &triangulation, z_top, Facing::Up);
    }
    add_side_walls(mesh, slots.wall, ring, z_bottom, z_top);

    Ok(triangulation)
}

/// Corners of an oriented rectangle, counter-clockwise
pub fn oriented_rect(center: Point2<f64>, direction: Vector2<f64>, half_length: f64, half_width: f64) -> [Point2<f64>; 4] {
    let d = direction.try_normalize(1e-12).unwrap_or_else(Vector2::x);
    let n = Vector2::new(-d.y, d.x);
    [
        center - d * half_length - n * half_width,
        center + d * half_length - n * half_width,
        center + d * half_length + n * half_width,
        center - d * half_length + n * half_width,
    ]
}

/// Closed box prism, e.g. a bridge pillar
pub fn add_box(
    mesh: &mut MeshBuffer,
    slot: usize,
    center: Point2<f64>,
    direction: Vector2<f64>,
    half_size: f64,
    z_bottom: f64,
    z_top: f64,
) -> Result<()> {
    let ring = oriented_rect(center, direction, half_size, half_size);
    extrude_prism(mesh, PrismSlots::single(slot), &ring, z_bottom, z_top)?;
    Ok(())
}
