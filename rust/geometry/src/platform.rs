// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Base platform under the generated area

use crate::mesh::MeshBuffer;
use citymesh_core::FeatureClass;
use nalgebra::{Point2, Point3};

/// Platform thickness for an area of the given radius: 2 % of the radius,
/// kept between 1 and 8 m
pub fn platform_height(radius: f64) -> f64 {
    (0.02 * radius).clamp(1.0, 8.0)
}

pub struct PlatformBuilder<'a> {
    slot: &'a str,
}

impl<'a> PlatformBuilder<'a> {
    pub fn new(slot: &'a str) -> Self {
        Self { slot }
    }

    /// Square slab whose top (z = 0) spans `center ± radius`. The sides slope
    /// outward so the bottom spans `center ± (radius + height)`.
    pub fn build(&self, center: Point2<f64>, radius: f64) -> MeshBuffer {
        let height = platform_height(radius);
        let bottom = radius + height;

        let corners = |half: f64, z: f64| {
            [
                Point3::new(center.x - half, center.y - half, z),
                Point3::new(center.x + half, center.y - half, z),
                Point3::new(center.x + half, center.y + half, z),
                Point3::new(center.x - half, center.y + half, z),
            ]
        };
        let top_ring = corners(radius, 0.0);
        let bottom_ring = corners(bottom, -height);

        let mut mesh = MeshBuffer::with_capacity(FeatureClass::Platform, 24);
        let slot = mesh.slot(self.slot);

        let top: Vec<u32> = top_ring
            .iter()
            .map(|p| mesh.add_vertex(*p, Point2::new(p.x, p.y)))
            .collect();
        mesh.add_quad(slot, top[0], top[1], top[2], top[3]);

        let base: Vec<u32> = bottom_ring
            .iter()
            .map(|p| mesh.add_vertex(*p, Point2::new(p.x, p.y)))
            .collect();
        mesh.add_quad(slot, base[0], base[3], base[2], base[1]);

        for i in 0..4 {
            let j = (i + 1) % 4;
            mesh.add_planar_quad(slot, [bottom_ring[i], bottom_ring[j], top_ring[j], top_ring[i]]);
        }

        mesh
    }
}
