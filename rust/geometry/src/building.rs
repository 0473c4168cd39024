// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building extrusion
//!
//! A building is planned first ([`BuildingPlan`]: footprint, height, roof
//! form, optional setback) and then extruded into a single [`MeshBuffer`]
//! with a wall slot (walls, bottom cap, ornaments) and a roof slot.
//!
//! Heights that are not tagged are estimated from the building type. The
//! ranges and the roof trigger are aesthetic policy, not data, and live in
//! [`BuildingPolicy`] so they can be configured.

use crate::error::Result;
use crate::extrusion::{
    add_inner_walls, add_ring_strip, add_side_walls, extrude_prism, Facing, PrismSlots,
};
use crate::material::MaterialCache;
use crate::mesh::MeshBuffer;
use crate::polygon::{area, centroid, erode, expand, normalize_ring};
use citymesh_core::{parse_length, FeatureClass, Tags};
use nalgebra::{Point2, Point3, Vector2};
use rand::Rng;
use smallvec::{smallvec, SmallVec};
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// Ornament gates: (minimum footprint area, minimum height)
const PLINTH_GATE: (f64, f64) = (20.0, 4.0);
const LEDGE_GATE: (f64, f64) = (20.0, 6.4);
const WINDOW_GATE: (f64, f64) = (30.0, 5.0);
const CORNICE_GATE: (f64, f64) = (30.0, 6.0);
const PARAPET_MIN_HEIGHT: f64 = 10.0;

const PLINTH_HEIGHT: f64 = 0.6;
const PLINTH_PROJECTION: f64 = 0.15;
const LEDGE_HALF_HEIGHT: f64 = 0.075;
const LEDGE_PROJECTION: f64 = 0.12;
const CORNICE_HEIGHT: f64 = 0.4;
const CORNICE_PROJECTION: f64 = 0.3;
const PARAPET_HEIGHT: f64 = 1.0;
const PARAPET_THICKNESS: f64 = 0.25;

const WINDOW_MIN_EDGE: f64 = 3.0;
const WINDOW_SPACING: f64 = 3.0;
const WINDOW_WIDTH: f64 = 1.2;
const WINDOW_HEIGHT: f64 = 1.4;
const WINDOW_SILL: f64 = 0.9;
const WINDOW_TOP_MARGIN: f64 = 0.3;
const WINDOW_RECESS: f64 = 0.15;
const WINDOW_SILL_LIP: f64 = 0.08;
const WINDOW_SILL_OVERHANG: f64 = 0.1;
const WINDOW_SILL_THICKNESS: f64 = 0.06;

/// Building types that may get a pyramid roof
const RESIDENTIAL_TYPES: &[&str] = &[
    "house",
    "detached",
    "semidetached_house",
    "bungalow",
    "residential",
    "terrace",
    "cabin",
    "hut",
    "farm",
];

/// Inclusive height range in meters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HeightRange {
    pub min: f64,
    pub max: f64,
}

impl HeightRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let (lo, hi) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        if lo == hi || !(hi - lo).is_finite() {
            return lo;
        }
        rng.gen_range(lo..=hi)
    }
}

/// Built-in estimates by `building=*` value
const BUILTIN_RANGES: &[(&str, HeightRange)] = &[
    ("house", HeightRange::new(4.0, 9.0)),
    ("detached", HeightRange::new(4.0, 9.0)),
    ("semidetached_house", HeightRange::new(4.0, 9.0)),
    ("bungalow", HeightRange::new(3.0, 5.0)),
    ("cabin", HeightRange::new(3.0, 5.0)),
    ("hut", HeightRange::new(2.5, 4.0)),
    ("farm", HeightRange::new(4.0, 8.0)),
    ("terrace", HeightRange::new(6.0, 12.0)),
    ("residential", HeightRange::new(9.0, 30.0)),
    ("apartments", HeightRange::new(9.0, 30.0)),
    ("commercial", HeightRange::new(8.0, 35.0)),
    ("retail", HeightRange::new(4.0, 12.0)),
    ("office", HeightRange::new(10.0, 40.0)),
    ("industrial", HeightRange::new(6.0, 14.0)),
    ("warehouse", HeightRange::new(6.0, 12.0)),
    ("garage", HeightRange::new(2.5, 3.5)),
    ("garages", HeightRange::new(2.5, 3.5)),
    ("shed", HeightRange::new(2.5, 3.5)),
    ("carport", HeightRange::new(2.5, 3.5)),
    ("church", HeightRange::new(12.0, 30.0)),
    ("cathedral", HeightRange::new(20.0, 45.0)),
    ("school", HeightRange::new(8.0, 16.0)),
    ("university", HeightRange::new(10.0, 25.0)),
    ("hospital", HeightRange::new(12.0, 30.0)),
];

/// Tunable building heuristics
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct BuildingPolicy {
    /// Footprints smaller than this (m²) are skipped
    pub min_footprint_area: f64,
    /// Height of one storey, used for `building:levels` and ledges
    pub floor_height: f64,
    /// Floor applied to tagged and derived heights
    pub min_height: f64,
    /// Per-type ranges that take precedence over the built-in table
    pub height_ranges: BTreeMap<String, HeightRange>,
    /// Range for types not found anywhere else
    pub default_range: HeightRange,
    /// Pyramid roofs only on buildings at most this tall
    pub pyramid_max_height: f64,
    /// Chance of a pyramid roof on an eligible residential building
    pub pyramid_chance: f64,
    /// Setback applies above this height...
    pub setback_min_height: f64,
    /// ...and above this footprint area
    pub setback_min_area: f64,
    /// Fraction of the height taken by the lower volume
    pub setback_ratio: f64,
}

impl Default for BuildingPolicy {
    fn default() -> Self {
        Self {
            min_footprint_area: 6.0,
            floor_height: 3.2,
            min_height: 2.5,
            height_ranges: BTreeMap::new(),
            default_range: HeightRange::new(5.0, 18.0),
            pyramid_max_height: 12.0,
            pyramid_chance: 0.55,
            setback_min_height: 15.0,
            setback_min_area: 60.0,
            setback_ratio: 0.6,
        }
    }
}

impl BuildingPolicy {
    /// Estimation range for a `building=*` value
    pub fn range_for(&self, kind: &str) -> HeightRange {
        if let Some(range) = self.height_ranges.get(kind) {
            return *range;
        }
        BUILTIN_RANGES
            .iter()
            .find(|(name, _)| *name == kind)
            .map(|(_, range)| *range)
            .unwrap_or(self.default_range)
    }
}

/// Material slot ids for buildings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct BuildingSlots {
    pub wall: String,
    pub roof: String,
}

impl Default for BuildingSlots {
    fn default() -> Self {
        Self {
            wall: "wall".to_string(),
            roof: "roof".to_string(),
        }
    }
}

/// Where the height came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightSource {
    Tag,
    Levels,
    Estimated,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoofForm {
    Flat,
    /// Single apex above the centroid, `rise` meters above the wall top
    Pyramid { rise: f64 },
}

/// Upper volume of a two-stage building
#[derive(Debug, Clone, PartialEq)]
pub struct Setback {
    /// Height of the terrace between the two volumes
    pub split: f64,
    /// Eroded footprint of the upper volume
    pub upper: Vec<Point2<f64>>,
}

/// Everything decided about a building before any geometry is emitted
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingPlan {
    /// Counter-clockwise footprint without closing point
    pub footprint: Vec<Point2<f64>>,
    pub area: f64,
    pub height: f64,
    pub height_source: HeightSource,
    pub roof: RoofForm,
    pub setback: Option<Setback>,
    pub floor_height: f64,
    pub wall_colour: Option<String>,
    pub roof_colour: Option<String>,
}

struct Volume<'a> {
    ring: &'a [Point2<f64>],
    bottom: f64,
    top: f64,
}

impl BuildingPlan {
    /// Heights of the floor-ledge bands, empty when the building is too small
    pub fn ledge_heights(&self) -> Vec<f64> {
        if self.area < LEDGE_GATE.0 || self.height < LEDGE_GATE.1 || self.floor_height <= 0.0 {
            return Vec::new();
        }
        let floors = (self.height / self.floor_height).floor() as usize;
        (1..floors).map(|k| k as f64 * self.floor_height).collect()
    }

    pub fn has_plinth(&self) -> bool {
        self.area >= PLINTH_GATE.0 && self.height >= PLINTH_GATE.1
    }

    pub fn has_windows(&self) -> bool {
        self.area >= WINDOW_GATE.0 && self.height >= WINDOW_GATE.1
    }

    pub fn has_cornice(&self) -> bool {
        self.area >= CORNICE_GATE.0 && self.height >= CORNICE_GATE.1
    }

    /// Parapets only crown flat roofs
    pub fn has_parapet(&self) -> bool {
        self.roof == RoofForm::Flat && self.height >= PARAPET_MIN_HEIGHT
    }

    /// Stacked volumes, bottom first
    fn volumes(&self) -> SmallVec<[Volume<'_>; 2]> {
        match &self.setback {
            None => smallvec![Volume {
                ring: &self.footprint,
                bottom: 0.0,
                top: self.height,
            }],
            Some(setback) => smallvec![
                Volume {
                    ring: &self.footprint,
                    bottom: 0.0,
                    top: setback.split,
                },
                Volume {
                    ring: &setback.upper,
                    bottom: setback.split,
                    top: self.height,
                },
            ],
        }
    }

    fn top_ring(&self) -> &[Point2<f64>] {
        self.setback
            .as_ref()
            .map(|s| s.upper.as_slice())
            .unwrap_or(&self.footprint)
    }
}

/// Plans and extrudes buildings
pub struct BuildingExtruder<'a> {
    policy: &'a BuildingPolicy,
    slots: &'a BuildingSlots,
    materials: &'a MaterialCache,
}

impl<'a> BuildingExtruder<'a> {
    pub fn new(policy: &'a BuildingPolicy, slots: &'a BuildingSlots, materials: &'a MaterialCache) -> Self {
        Self {
            policy,
            slots,
            materials,
        }
    }

    /// Plan and extrude in one step. `Ok(None)` when the footprint is skipped.
    pub fn build<R: Rng + ?Sized>(
        &self,
        footprint: &[Point2<f64>],
        tags: &Tags,
        rng: &mut R,
    ) -> Result<Option<MeshBuffer>> {
        let Some(plan) = self.plan(footprint, tags, rng) else {
            return Ok(None);
        };
        self.extrude(&plan).map(Some)
    }

    /// Decide height, roof and setback. `None` when the footprint is
    /// degenerate or below the minimum area.
    pub fn plan<R: Rng + ?Sized>(
        &self,
        footprint: &[Point2<f64>],
        tags: &Tags,
        rng: &mut R,
    ) -> Option<BuildingPlan> {
        let ring = normalize_ring(footprint)?;
        let footprint_area = area(&ring);
        if footprint_area < self.policy.min_footprint_area {
            tracing::trace!(area = footprint_area, "Footprint below minimum area, skipped");
            return None;
        }

        let kind = tags.get("building").map(String::as_str).unwrap_or("yes");
        let (height, height_source) = self.resolve_height(tags, kind, footprint_area, rng);

        let setback = (height > self.policy.setback_min_height
            && footprint_area > self.policy.setback_min_area)
            .then(|| {
                let inset = (0.12 * footprint_area.sqrt()).clamp(1.5, 4.0);
                normalize_ring(&erode(&ring, inset)).map(|upper| Setback {
                    split: height * self.policy.setback_ratio,
                    upper,
                })
            })
            .flatten();

        let top_area = setback.as_ref().map(|s| area(&s.upper)).unwrap_or(footprint_area);
        let roof = self.choose_roof(tags, kind, height, top_area, rng);

        Some(BuildingPlan {
            footprint: ring,
            area: footprint_area,
            height,
            height_source,
            roof,
            setback,
            floor_height: self.policy.floor_height,
            wall_colour: tags.get("building:colour").cloned(),
            roof_colour: tags.get("roof:colour").cloned(),
        })
    }

    /// Height from the `height` tag, then `building:levels`, then a random
    /// estimate for the building type
    pub fn resolve_height<R: Rng + ?Sized>(
        &self,
        tags: &Tags,
        kind: &str,
        footprint_area: f64,
        rng: &mut R,
    ) -> (f64, HeightSource) {
        if let Some(h) = tags.get("height").and_then(|v| parse_length(v)) {
            return (h.max(self.policy.min_height), HeightSource::Tag);
        }

        if let Some(levels) = tags
            .get("building:levels")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|l| l.is_finite() && *l > 0.0)
        {
            let h = levels * self.policy.floor_height;
            return (h.max(self.policy.min_height), HeightSource::Levels);
        }

        let mut h = self.policy.range_for(kind).sample(rng);
        if footprint_area < 40.0 {
            h = h.min(6.0);
        } else if footprint_area < 100.0 {
            h = h.min(12.0);
        }
        (h.max(self.policy.min_height), HeightSource::Estimated)
    }

    fn choose_roof<R: Rng + ?Sized>(
        &self,
        tags: &Tags,
        kind: &str,
        height: f64,
        top_area: f64,
        rng: &mut R,
    ) -> RoofForm {
        if height > self.policy.pyramid_max_height {
            return RoofForm::Flat;
        }

        let pyramid = match tags.get("roof:shape").map(String::as_str) {
            Some("pyramidal" | "hipped" | "gabled") => true,
            Some("flat") => false,
            _ => {
                RESIDENTIAL_TYPES.contains(&kind)
                    && rng.gen_bool(self.policy.pyramid_chance.clamp(0.0, 1.0))
            }
        };

        if pyramid {
            RoofForm::Pyramid {
                rise: (0.3 * top_area.sqrt()).clamp(1.5, 5.0),
            }
        } else {
            RoofForm::Flat
        }
    }

    /// Emit the solid and its ornaments
    pub fn extrude(&self, plan: &BuildingPlan) -> Result<MeshBuffer> {
        let wall_name = self.materials.resolve(&self.slots.wall, plan.wall_colour.as_deref());
        let roof_name = self.materials.resolve(&self.slots.roof, plan.roof_colour.as_deref());

        let mut mesh = MeshBuffer::new(FeatureClass::Building);
        let wall = mesh.slot(&wall_name);
        let roof = mesh.slot(&roof_name);

        let volumes = plan.volumes();
        let last = volumes.len() - 1;
        for (i, volume) in volumes.iter().enumerate() {
            // Lower volumes get a terrace cap; the top one only when flat
            let top = if i < last || plan.roof == RoofForm::Flat {
                Some(roof)
            } else {
                None
            };
            let slots = PrismSlots {
                wall,
                top,
                bottom: Some(wall),
            };
            extrude_prism(&mut mesh, slots, volume.ring, volume.bottom, volume.top)?;
        }

        if let RoofForm::Pyramid { rise } = plan.roof {
            add_pyramid(&mut mesh, roof, plan.top_ring(), plan.height, rise);
        }

        self.add_ornaments(&mut mesh, wall, plan, &volumes);
        Ok(mesh)
    }

    fn add_ornaments(&self, mesh: &mut MeshBuffer, slot: usize, plan: &BuildingPlan, volumes: &[Volume<'_>]) {
        let h = plan.height;

        if plan.has_plinth() {
            let outer = expand(&plan.footprint, PLINTH_PROJECTION);
            add_side_walls(mesh, slot, &outer, 0.0, PLINTH_HEIGHT);
            add_ring_strip(mesh, slot, &outer, &plan.footprint, PLINTH_HEIGHT, Facing::Up);
        }

        for z in plan.ledge_heights() {
            if let Some(volume) = volumes.iter().find(|v| z >= v.bottom && z < v.top) {
                add_band(mesh, slot, volume.ring, z - LEDGE_HALF_HEIGHT, z + LEDGE_HALF_HEIGHT, LEDGE_PROJECTION);
            }
        }

        if plan.has_windows() {
            for volume in volumes {
                for site in window_sites(volume.ring, volume.bottom, volume.top, plan.floor_height) {
                    add_window(mesh, slot, &site);
                }
            }
        }

        let top_ring = plan.top_ring();
        if plan.has_cornice() {
            add_band(mesh, slot, top_ring, h - CORNICE_HEIGHT, h, CORNICE_PROJECTION);
        }

        if plan.has_parapet() {
            let inner = erode(top_ring, PARAPET_THICKNESS);
            add_side_walls(mesh, slot, top_ring, h, h + PARAPET_HEIGHT);
            add_inner_walls(mesh, slot, &inner, h, h + PARAPET_HEIGHT);
            add_ring_strip(mesh, slot, top_ring, &inner, h + PARAPET_HEIGHT, Facing::Up);
        }
    }
}

/// Triangles from each footprint edge up to one apex over the centroid
fn add_pyramid(mesh: &mut MeshBuffer, slot: usize, ring: &[Point2<f64>], z: f64, rise: f64) {
    let c = centroid(ring);
    let apex = mesh.add_vertex(Point3::new(c.x, c.y, z + rise), c);
    let n = ring.len();
    for i in 0..n {
        let p = ring[i];
        let q = ring[(i + 1) % n];
        let a = mesh.add_vertex(Point3::new(p.x, p.y, z), p);
        let b = mesh.add_vertex(Point3::new(q.x, q.y, z), q);
        mesh.add_triangle(slot, a, b, apex);
    }
}

/// Horizontal band projecting out of the wall: outer face, top and underside
fn add_band(mesh: &mut MeshBuffer, slot: usize, ring: &[Point2<f64>], z_bottom: f64, z_top: f64, projection: f64) {
    let outer = expand(ring, projection);
    add_side_walls(mesh, slot, &outer, z_bottom, z_top);
    add_ring_strip(mesh, slot, &outer, ring, z_top, Facing::Up);
    add_ring_strip(mesh, slot, &outer, ring, z_bottom, Facing::Down);
}

/// One window opening on a wall edge
#[derive(Debug, Clone, Copy, PartialEq)]
struct WindowSite {
    center: Point2<f64>,
    /// Unit edge direction; the wall faces its right perpendicular
    along: Vector2<f64>,
    sill: f64,
    head: f64,
}

/// One opening per floor on every edge of at least `WINDOW_MIN_EDGE`,
/// spread at `WINDOW_SPACING` along longer edges
fn window_sites(ring: &[Point2<f64>], bottom: f64, top: f64, floor_height: f64) -> Vec<WindowSite> {
    if floor_height <= 0.0 {
        return Vec::new();
    }
    let n = ring.len();
    let floors = ((top - bottom) / floor_height).floor() as usize;
    let mut sites = Vec::new();

    for floor in 0..floors {
        let sill = bottom + floor as f64 * floor_height + WINDOW_SILL;
        let head = sill + WINDOW_HEIGHT;
        if head > top - WINDOW_TOP_MARGIN {
            break;
        }

        for i in 0..n {
            let p0 = ring[i];
            let p1 = ring[(i + 1) % n];
            let len = (p1 - p0).norm();
            if len < WINDOW_MIN_EDGE {
                continue;
            }
            let along = (p1 - p0) / len;
            let count = (len / WINDOW_SPACING).floor().max(1.0) as usize;
            let step = len / count as f64;
            sites.extend((0..count).map(|w| WindowSite {
                center: p0 + along * (step * (w as f64 + 0.5)),
                along,
                sill,
                head,
            }));
        }
    }
    sites
}

/// Opening set into the wall: pane at the back of the recess, jambs, sill
/// and lintel lining it, and a sill lip standing out of the wall plane
fn add_window(mesh: &mut MeshBuffer, slot: usize, site: &WindowSite) {
    let along = site.along;
    let out = Vector2::new(along.y, -along.x);
    let at = |s: f64, depth: f64, z: f64| {
        let p = site.center + along * s + out * depth;
        Point3::new(p.x, p.y, z)
    };

    let (sill, head) = (site.sill, site.head);
    let hw = WINDOW_WIDTH / 2.0;
    let lw = hw + WINDOW_SILL_OVERHANG;
    let r = -WINDOW_RECESS;
    let lip = WINDOW_SILL_LIP;
    let t = WINDOW_SILL_THICKNESS;

    // Pane, facing out
    mesh.add_planar_quad(slot, [at(-hw, r, sill), at(hw, r, sill), at(hw, r, head), at(-hw, r, head)]);
    // Jambs, facing into the opening
    mesh.add_planar_quad(slot, [at(-hw, 0.0, sill), at(-hw, r, sill), at(-hw, r, head), at(-hw, 0.0, head)]);
    mesh.add_planar_quad(slot, [at(hw, r, sill), at(hw, 0.0, sill), at(hw, 0.0, head), at(hw, r, head)]);
    // Sill floor, facing up
    mesh.add_planar_quad(slot, [at(-hw, r, sill), at(-hw, 0.0, sill), at(hw, 0.0, sill), at(hw, r, sill)]);
    // Lintel soffit, facing down
    mesh.add_planar_quad(slot, [at(-hw, r, head), at(hw, r, head), at(hw, 0.0, head), at(-hw, 0.0, head)]);
    // Sill lip: top, front, underside
    mesh.add_planar_quad(slot, [at(-lw, 0.0, sill), at(-lw, lip, sill), at(lw, lip, sill), at(lw, 0.0, sill)]);
    mesh.add_planar_quad(slot, [at(-lw, lip, sill - t), at(lw, lip, sill - t), at(lw, lip, sill), at(-lw, lip, sill)]);
    mesh.add_planar_quad(slot, [at(-lw, 0.0, sill - t), at(lw, 0.0, sill - t), at(lw, lip, sill - t), at(-lw, lip, sill - t)]);
}
