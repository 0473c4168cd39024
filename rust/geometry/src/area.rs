// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Flat area features (water, parks)

use crate::error::{Error, Result};
use crate::extrusion::{add_cap, add_side_walls, Facing};
use crate::mesh::MeshBuffer;
use crate::polygon::normalize_ring;
use crate::triangulation::triangulate_or_hull;
use citymesh_core::{FeatureClass, FeatureKind};
use nalgebra::Point2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const WATER_ELEVATION: f64 = 0.02;
pub const PARK_ELEVATION: f64 = 0.04;
/// Depth of the perimeter walls below the top surface
pub const AREA_EDGE_DEPTH: f64 = 0.15;

/// Material slot ids for area features
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct AreaSlots {
    pub water: String,
    pub park: String,
}

impl Default for AreaSlots {
    fn default() -> Self {
        Self {
            water: "water".to_string(),
            park: "park".to_string(),
        }
    }
}

pub struct AreaExtruder<'a> {
    slots: &'a AreaSlots,
}

impl<'a> AreaExtruder<'a> {
    pub fn new(slots: &'a AreaSlots) -> Self {
        Self { slots }
    }

    /// Top surface plus a shallow perimeter skirt. `Ok(None)` for a
    /// degenerate ring.
    pub fn build(&self, ring: &[Point2<f64>], kind: FeatureKind) -> Result<Option<MeshBuffer>> {
        let (class, slot_name, elevation) = match kind {
            FeatureKind::Water => (FeatureClass::WaterArea, &self.slots.water, WATER_ELEVATION),
            FeatureKind::Park => (FeatureClass::ParkArea, &self.slots.park, PARK_ELEVATION),
            other => {
                return Err(Error::InvalidFootprint(format!("{:?} is not an area feature", other)));
            }
        };

        let Some(ring) = normalize_ring(ring) else {
            return Ok(None);
        };

        let triangulation = triangulate_or_hull(&ring)?;
        let mut mesh = MeshBuffer::with_capacity(class, triangulation.points.len() + ring.len() * 4);
        let slot = mesh.slot(slot_name);
        add_cap(&mut mesh, slot, &triangulation, elevation, Facing::Up);
        add_side_walls(&mut mesh, slot, &ring, elevation - AREA_EDGE_DEPTH, elevation);
        Ok(Some(mesh))
    }
}
