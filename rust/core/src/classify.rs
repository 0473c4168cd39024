// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tag-based feature classification

use crate::model::{Tags, Way};
use crate::relation::is_water_bearing;
use std::fmt;

/// What a way should be built as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Building,
    Road,
    Bridge,
    Water,
    Park,
}

/// Classification carried by every emitted mesh, for the scene consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureClass {
    Building,
    Road,
    Bridge,
    ParkArea,
    WaterArea,
    Tree,
    Platform,
}

impl FeatureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureClass::Building => "building",
            FeatureClass::Road => "road",
            FeatureClass::Bridge => "bridge",
            FeatureClass::ParkArea => "park-area",
            FeatureClass::WaterArea => "water-area",
            FeatureClass::Tree => "tree",
            FeatureClass::Platform => "platform",
        }
    }
}

impl fmt::Display for FeatureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<FeatureKind> for FeatureClass {
    fn from(kind: FeatureKind) -> Self {
        match kind {
            FeatureKind::Building => FeatureClass::Building,
            FeatureKind::Road => FeatureClass::Road,
            FeatureKind::Bridge => FeatureClass::Bridge,
            FeatureKind::Water => FeatureClass::WaterArea,
            FeatureKind::Park => FeatureClass::ParkArea,
        }
    }
}

/// Highway values that never produce a drivable or walkable surface
const NON_SURFACE_HIGHWAYS: &[&str] = &[
    "proposed",
    "construction",
    "abandoned",
    "platform",
    "bus_stop",
    "street_lamp",
    "elevator",
    "corridor",
    "services",
    "rest_area",
];

#[inline]
fn is_truthy(value: &str) -> bool {
    !matches!(value, "no" | "false" | "0")
}

/// A bridge tag that is present and not explicitly negated
pub fn is_bridge(tags: &Tags) -> bool {
    tags.get("bridge").is_some_and(|v| is_truthy(v))
}

fn is_building(tags: &Tags) -> bool {
    tags.get("building").is_some_and(|v| is_truthy(v))
        || tags.get("building:part").is_some_and(|v| is_truthy(v))
}

fn is_road(tags: &Tags) -> bool {
    let Some(highway) = tags.get("highway") else {
        return false;
    };
    if NON_SURFACE_HIGHWAYS.contains(&highway.as_str()) {
        return false;
    }
    // Pedestrian squares and similar are areas, not strips
    tags.get("area").map(String::as_str) != Some("yes")
}

fn is_park(tags: &Tags) -> bool {
    let get = |key: &str| tags.get(key).map(String::as_str);

    matches!(
        get("leisure"),
        Some("park" | "garden" | "playground" | "pitch" | "nature_reserve" | "golf_course")
    ) || matches!(
        get("landuse"),
        Some(
            "grass"
                | "meadow"
                | "forest"
                | "recreation_ground"
                | "village_green"
                | "park"
                | "cemetery"
        )
    ) || matches!(get("natural"), Some("wood" | "scrub" | "grassland" | "heath"))
}

/// Classify a way. Returns `None` for ways that produce no geometry.
///
/// Area kinds (water, park) require a closed way; synthetic ways built from
/// relations are closed and go through the same rules.
pub fn classify(way: &Way) -> Option<FeatureKind> {
    let tags = &way.tags;

    if is_building(tags) {
        return Some(FeatureKind::Building);
    }
    if is_road(tags) {
        return Some(if is_bridge(tags) {
            FeatureKind::Bridge
        } else {
            FeatureKind::Road
        });
    }
    if !way.is_closed() {
        return None;
    }
    if is_water_bearing(tags) {
        return Some(FeatureKind::Water);
    }
    if is_park(tags) {
        return Some(FeatureKind::Park);
    }
    None
}
