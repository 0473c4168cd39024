// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Road and bridge extrusion
//!
//! Roads are smoothed and extruded as a thin slab just above the ground,
//! with optional sidewalks. Bridges keep their surveyed path and get a
//! raised deck, optional railings and box pillars. Both report their two
//! endpoints so a later pass can place junctions or connectors.

use crate::error::Result;
use crate::extrusion::add_box;
use crate::mesh::MeshBuffer;
use crate::path::{dedup_path, offset_path, path_length, sample_at, smooth, tangent, PATH_MERGE_DISTANCE};
use crate::ribbon::add_ribbon;
use citymesh_core::{parse_length, FeatureClass, Tags};
use nalgebra::{Point2, Vector2};
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Road surface top, above area features
pub const ROAD_TOP: f64 = 0.08;
const ROAD_THICKNESS: f64 = 0.25;

const SIDEWALK_WIDTH: f64 = 1.5;
const SIDEWALK_RISE: f64 = 0.12;
const SIDEWALK_THICKNESS: f64 = 0.2;
const SIDEWALK_MIN_ROAD_WIDTH: f64 = 6.0;

pub const BRIDGE_DECK_TOP: f64 = 6.0;
const BRIDGE_DECK_THICKNESS: f64 = 0.8;
const BRIDGE_EXTRA_WIDTH: f64 = 2.0;
const RAILING_WIDTH: f64 = 0.3;
const RAILING_HEIGHT: f64 = 1.0;
const PILLAR_SIZE: f64 = 1.0;
const PILLAR_SPACING: f64 = 18.0;

/// Built-in widths by `highway=*` class
const BUILTIN_WIDTHS: &[(&str, f64)] = &[
    ("motorway", 12.0),
    ("trunk", 11.0),
    ("primary", 10.0),
    ("secondary", 8.0),
    ("tertiary", 7.0),
    ("residential", 6.0),
    ("unclassified", 5.5),
    ("living_street", 5.0),
    ("service", 4.0),
    ("track", 3.0),
    ("cycleway", 2.5),
    ("footway", 2.0),
    ("path", 2.0),
    ("pedestrian", 2.0),
    ("bridleway", 2.0),
    ("steps", 2.0),
];

const LINK_WIDTH_FACTOR: f64 = 0.7;

/// Classes that never get sidewalks
const FOOTPATH_CLASSES: &[&str] = &["footway", "path", "pedestrian", "bridleway", "steps", "cycleway", "track"];

/// Catmull-Rom subdivisions per segment for a road class
pub fn smoothing_subdivisions(class: &str) -> usize {
    match class {
        "motorway" | "trunk" | "primary" => 6,
        "secondary" | "tertiary" => 4,
        _ => 3,
    }
}

/// Road width configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct RoadPolicy {
    /// Per-class widths taking precedence over the built-in table
    pub width_overrides: BTreeMap<String, f64>,
    /// Width for classes found nowhere else
    pub default_width: f64,
}

impl Default for RoadPolicy {
    fn default() -> Self {
        Self {
            width_overrides: BTreeMap::new(),
            default_width: 5.0,
        }
    }
}

impl RoadPolicy {
    /// Width of a class: override table, built-in table, `*_link` at 70 %
    /// of the parent class, then the default
    pub fn class_width(&self, class: &str) -> f64 {
        if let Some(&w) = self.width_overrides.get(class) {
            return w;
        }
        if let Some(&(_, w)) = BUILTIN_WIDTHS.iter().find(|(name, _)| *name == class) {
            return w;
        }
        if let Some(parent) = class.strip_suffix("_link") {
            return self.class_width(parent) * LINK_WIDTH_FACTOR;
        }
        self.default_width
    }

    /// Width of a way: a positive `width` tag wins over the class
    pub fn width(&self, tags: &Tags) -> f64 {
        if let Some(w) = tags
            .get("width")
            .and_then(|v| parse_length(v))
            .filter(|w| *w > 0.0)
        {
            return w;
        }
        self.class_width(tags.get("highway").map(String::as_str).unwrap_or(""))
    }
}

/// Material slot ids for roads and bridges. Sidewalks and railings are only
/// built when their slot is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct RoadSlots {
    pub road: String,
    pub sidewalk: Option<String>,
    pub deck: String,
    pub railing: Option<String>,
    pub pillar: String,
}

impl Default for RoadSlots {
    fn default() -> Self {
        Self {
            road: "road".to_string(),
            sidewalk: Some("sidewalk".to_string()),
            deck: "deck".to_string(),
            railing: Some("railing".to_string()),
            pillar: "pillar".to_string(),
        }
    }
}

/// Open end of a road or bridge
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub position: Point2<f64>,
    /// Unit direction pointing away from the road
    pub direction: Vector2<f64>,
    pub width: f64,
    pub class: String,
    pub slot: String,
}

/// Endpoints of every road and bridge built in the current pass.
///
/// Append-only; emptied only by [`EndpointRegistry::clear`].
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    endpoints: Vec<Endpoint>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, endpoints: impl IntoIterator<Item = Endpoint>) {
        self.endpoints.extend(endpoints);
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn clear(&mut self) {
        self.endpoints.clear();
    }
}

/// Mesh of one road or bridge plus its two endpoints
#[derive(Debug, Clone)]
pub struct StripOutput {
    pub mesh: MeshBuffer,
    pub endpoints: [Endpoint; 2],
}

fn endpoints_of(path: &[Point2<f64>], width: f64, class: &str, slot: &str) -> [Endpoint; 2] {
    let last = path.len() - 1;
    let make = |position: Point2<f64>, direction: Vector2<f64>| Endpoint {
        position,
        direction,
        width,
        class: class.to_string(),
        slot: slot.to_string(),
    };
    [
        make(path[0], -tangent(path, 0)),
        make(path[last], tangent(path, last)),
    ]
}

/// Extrudes `highway=*` ways at ground level
pub struct RoadExtruder<'a> {
    policy: &'a RoadPolicy,
    slots: &'a RoadSlots,
}

impl<'a> RoadExtruder<'a> {
    pub fn new(policy: &'a RoadPolicy, slots: &'a RoadSlots) -> Self {
        Self { policy, slots }
    }

    /// `Ok(None)` when the path collapses to a single point
    pub fn build(&self, path: &[Point2<f64>], tags: &Tags) -> Result<Option<StripOutput>> {
        let class = tags.get("highway").map(String::as_str).unwrap_or("");
        let width = self.policy.width(tags);
        let points = smooth(path, smoothing_subdivisions(class));
        if points.len() < 2 {
            return Ok(None);
        }

        let mut mesh = MeshBuffer::with_capacity(FeatureClass::Road, points.len() * 4);
        let road = mesh.slot(&self.slots.road);
        add_ribbon(&mut mesh, road, &points, width / 2.0, ROAD_TOP - ROAD_THICKNESS, ROAD_TOP)?;

        if let Some(sidewalk_slot) = &self.slots.sidewalk {
            if width >= SIDEWALK_MIN_ROAD_WIDTH && !FOOTPATH_CLASSES.contains(&class) {
                let slot = mesh.slot(sidewalk_slot);
                let top = ROAD_TOP + SIDEWALK_RISE;
                let lateral = width / 2.0 + SIDEWALK_WIDTH / 2.0;
                for side in [1.0, -1.0] {
                    let curb = offset_path(&points, side * lateral);
                    add_ribbon(&mut mesh, slot, &curb, SIDEWALK_WIDTH / 2.0, top - SIDEWALK_THICKNESS, top)?;
                }
            }
        }

        let endpoints = endpoints_of(&points, width, class, &self.slots.road);
        Ok(Some(StripOutput { mesh, endpoints }))
    }
}

/// Extrudes bridges: raised deck, railings, pillars
pub struct BridgeExtruder<'a> {
    policy: &'a RoadPolicy,
    slots: &'a RoadSlots,
}

impl<'a> BridgeExtruder<'a> {
    pub fn new(policy: &'a RoadPolicy, slots: &'a RoadSlots) -> Self {
        Self { policy, slots }
    }

    /// Number of pillars for a deck of the given length
    pub fn pillar_count(length: f64) -> usize {
        ((length / PILLAR_SPACING).floor() as usize + 1).max(2)
    }

    /// `Ok(None)` when the path collapses to a single point
    pub fn build(&self, path: &[Point2<f64>], tags: &Tags) -> Result<Option<StripOutput>> {
        let class = tags.get("highway").map(String::as_str).unwrap_or("");
        let deck_width = self.policy.width(tags) + BRIDGE_EXTRA_WIDTH;
        let points = dedup_path(path, PATH_MERGE_DISTANCE);
        if points.len() < 2 {
            return Ok(None);
        }

        let deck_bottom = BRIDGE_DECK_TOP - BRIDGE_DECK_THICKNESS;
        let mut mesh = MeshBuffer::with_capacity(FeatureClass::Bridge, points.len() * 4);
        let deck = mesh.slot(&self.slots.deck);
        add_ribbon(&mut mesh, deck, &points, deck_width / 2.0, deck_bottom, BRIDGE_DECK_TOP)?;

        if let Some(railing_slot) = &self.slots.railing {
            let slot = mesh.slot(railing_slot);
            let lateral = deck_width / 2.0 - RAILING_WIDTH / 2.0;
            for side in [1.0, -1.0] {
                let rail = offset_path(&points, side * lateral);
                add_ribbon(
                    &mut mesh,
                    slot,
                    &rail,
                    RAILING_WIDTH / 2.0,
                    BRIDGE_DECK_TOP,
                    BRIDGE_DECK_TOP + RAILING_HEIGHT,
                )?;
            }
        }

        let pillar = mesh.slot(&self.slots.pillar);
        let length = path_length(&points);
        let count = Self::pillar_count(length);
        for i in 0..count {
            let distance = length * i as f64 / (count - 1) as f64;
            if let Some((position, direction)) = sample_at(&points, distance) {
                add_box(&mut mesh, pillar, position, direction, PILLAR_SIZE / 2.0, 0.0, deck_bottom)?;
            }
        }

        tracing::trace!(length, pillars = count, "Bridge deck built");

        let endpoints = endpoints_of(&points, deck_width, class, &self.slots.deck);
        Ok(Some(StripOutput { mesh, endpoints }))
    }
}
