// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures

use crate::error::{Error, Result};
use citymesh_core::FeatureClass;
use nalgebra::{Point2, Point3, Vector3};

/// Triangle list drawn with one material slot
#[derive(Debug, Clone, PartialEq)]
pub struct SubMesh {
    /// Opaque material-slot identifier (e.g. "wall", "roof", "deck")
    pub slot: String,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
}

impl SubMesh {
    pub fn new(slot: impl Into<String>) -> Self {
        Self {
            slot: slot.into(),
            indices: Vec::new(),
        }
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Triangle mesh for one generated feature.
///
/// Positions are local meters (X east, Y north, Z up). All sub-meshes index
/// into the same vertex arrays.
#[derive(Debug, Clone)]
pub struct MeshBuffer {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Texture coordinates (u, v), one pair per vertex
    pub uvs: Vec<f32>,
    /// Index lists, one per material slot
    pub submeshes: Vec<SubMesh>,
    /// What the consumer should treat this mesh as
    pub class: FeatureClass,
}

impl MeshBuffer {
    /// Create a new empty mesh
    pub fn new(class: FeatureClass) -> Self {
        Self {
            positions: Vec::new(),
            uvs: Vec::new(),
            submeshes: Vec::new(),
            class,
        }
    }

    /// Create a mesh with capacity
    pub fn with_capacity(class: FeatureClass, vertex_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            uvs: Vec::with_capacity(vertex_count * 2),
            submeshes: Vec::new(),
            class,
        }
    }

    /// Index of the sub-mesh for `slot`, creating it on first use
    pub fn slot(&mut self, slot: &str) -> usize {
        if let Some(i) = self.submeshes.iter().position(|s| s.slot == slot) {
            return i;
        }
        self.submeshes.push(SubMesh::new(slot));
        self.submeshes.len() - 1
    }

    /// Add a vertex and return its index
    #[inline]
    pub fn add_vertex(&mut self, position: Point3<f64>, uv: Point2<f64>) -> u32 {
        let index = self.vertex_count() as u32;
        self.positions.push(position.x as f32);
        self.positions.push(position.y as f32);
        self.positions.push(position.z as f32);
        self.uvs.push(uv.x as f32);
        self.uvs.push(uv.y as f32);
        index
    }

    /// Add a triangle to the sub-mesh at `slot` (see [`MeshBuffer::slot`])
    #[inline]
    pub fn add_triangle(&mut self, slot: usize, i0: u32, i1: u32, i2: u32) {
        let indices = &mut self.submeshes[slot].indices;
        indices.push(i0);
        indices.push(i1);
        indices.push(i2);
    }

    /// Add a quad as two triangles (a, b, c) and (a, c, d)
    #[inline]
    pub fn add_quad(&mut self, slot: usize, a: u32, b: u32, c: u32, d: u32) {
        self.add_triangle(slot, a, b, c);
        self.add_triangle(slot, a, c, d);
    }

    /// Add four fresh vertices and one quad over them.
    ///
    /// UVs span the quad as (0,0) (w,0) (w,h) (0,h) where w and h are the
    /// lengths of the first and last edge, so textures keep a metric scale.
    pub fn add_planar_quad(&mut self, slot: usize, corners: [Point3<f64>; 4]) {
        let w = (corners[1] - corners[0]).norm();
        let h = (corners[3] - corners[0]).norm();
        let a = self.add_vertex(corners[0], Point2::new(0.0, 0.0));
        let b = self.add_vertex(corners[1], Point2::new(w, 0.0));
        let c = self.add_vertex(corners[2], Point2::new(w, h));
        let d = self.add_vertex(corners[3], Point2::new(0.0, h));
        self.add_quad(slot, a, b, c, d);
    }

    /// Merge another mesh into this one, matching sub-meshes by slot name
    pub fn merge(&mut self, other: &MeshBuffer) {
        if other.is_empty() {
            return;
        }

        let vertex_offset = self.vertex_count() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.uvs.extend_from_slice(&other.uvs);

        for sub in &other.submeshes {
            let slot = self.slot(&sub.slot);
            self.submeshes[slot]
                .indices
                .extend(sub.indices.iter().map(|&i| i + vertex_offset));
        }
    }

    /// Move every vertex by `offset`
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for chunk in self.positions.chunks_exact_mut(3) {
            chunk[0] = (chunk[0] as f64 + offset.x) as f32;
            chunk[1] = (chunk[1] as f64 + offset.y) as f32;
            chunk[2] = (chunk[2] as f64 + offset.z) as f32;
        }
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Total triangle count across all slots
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.submeshes.iter().map(SubMesh::triangle_count).sum()
    }

    /// Triangle count of one slot (0 when the slot does not exist)
    pub fn slot_triangle_count(&self, slot: &str) -> usize {
        self.submesh(slot).map(SubMesh::triangle_count).unwrap_or(0)
    }

    /// Sub-mesh by slot name
    pub fn submesh(&self, slot: &str) -> Option<&SubMesh> {
        self.submeshes.iter().find(|s| s.slot == slot)
    }

    /// Vertex position as f64
    #[inline]
    pub fn position(&self, index: u32) -> Point3<f64> {
        let i = index as usize * 3;
        Point3::new(
            self.positions[i] as f64,
            self.positions[i + 1] as f64,
            self.positions[i + 2] as f64,
        )
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Calculate bounds (min, max)
    pub fn bounds(&self) -> (Point3<f32>, Point3<f32>) {
        if self.is_empty() {
            return (Point3::origin(), Point3::origin());
        }

        let mut min = Point3::new(f32::MAX, f32::MAX, f32::MAX);
        let mut max = Point3::new(f32::MIN, f32::MIN, f32::MIN);

        self.positions.chunks_exact(3).for_each(|chunk| {
            min.x = min.x.min(chunk[0]);
            min.y = min.y.min(chunk[1]);
            min.z = min.z.min(chunk[2]);
            max.x = max.x.max(chunk[0]);
            max.y = max.y.max(chunk[1]);
            max.z = max.z.max(chunk[2]);
        });

        (min, max)
    }

    /// Signed volume enclosed by the triangles (divergence theorem).
    ///
    /// Positive for a closed, outward-wound solid.
    pub fn signed_volume(&self) -> f64 {
        let mut volume = 0.0;
        for sub in &self.submeshes {
            for tri in sub.indices.chunks_exact(3) {
                let a = self.position(tri[0]).coords;
                let b = self.position(tri[1]).coords;
                let c = self.position(tri[2]).coords;
                volume += a.dot(&b.cross(&c));
            }
        }
        volume / 6.0
    }

    /// Check that every index is in range and the attribute arrays agree
    pub fn validate(&self) -> Result<()> {
        if self.positions.len() % 3 != 0 {
            return Err(Error::InvalidMesh("position array is not a multiple of 3".into()));
        }
        if self.uvs.len() / 2 != self.vertex_count() {
            return Err(Error::InvalidMesh(format!(
                "{} uv pairs for {} vertices",
                self.uvs.len() / 2,
                self.vertex_count()
            )));
        }

        let n = self.vertex_count() as u32;
        for sub in &self.submeshes {
            if sub.indices.len() % 3 != 0 {
                return Err(Error::InvalidMesh(format!("slot '{}' has a partial triangle", sub.slot)));
            }
            if let Some(&bad) = sub.indices.iter().find(|&&i| i >= n) {
                return Err(Error::InvalidMesh(format!(
                    "slot '{}' references vertex {} of {}",
                    sub.slot, bad, n
                )));
            }
        }
        Ok(())
    }

    /// Clear the mesh
    #[inline]
    pub fn clear(&mut self) {
        self.positions.clear();
        self.uvs.clear();
        self.submeshes.clear();
    }
}
