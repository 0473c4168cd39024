// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Generation configuration, read from a JSON file and overlaid by
//! environment variables.
//!
//! | variable | field |
//! |---|---|
//! | `CITYMESH_LAT` | `lat` |
//! | `CITYMESH_LON` | `lon` |
//! | `CITYMESH_RADIUS` | `radius` |
//! | `CITYMESH_SEED` | `seed` |
//! | `CITYMESH_TREE_COUNT` | `tree_count` |

use crate::error::{PipelineError, Result};
use citymesh_geometry::rng::DEFAULT_SEED;
use citymesh_geometry::{AreaSlots, BuildingPolicy, BuildingSlots, RoadPolicy, RoadSlots, TreeSlots};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Web Mercator stops being usable past this latitude
const MAX_LATITUDE: f64 = 85.05;

/// Material slot ids handed to every builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialSlots {
    pub building: BuildingSlots,
    pub road: RoadSlots,
    pub area: AreaSlots,
    pub tree: TreeSlots,
    pub platform: String,
}

impl Default for MaterialSlots {
    fn default() -> Self {
        Self {
            building: BuildingSlots::default(),
            road: RoadSlots::default(),
            area: AreaSlots::default(),
            tree: TreeSlots::default(),
            platform: "platform".to_string(),
        }
    }
}

/// Everything a generation pass needs besides the map document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Center latitude; becomes the local origin
    pub lat: f64,
    /// Center longitude
    pub lon: f64,
    /// Area radius in meters
    pub radius: f64,
    pub seed: u64,
    /// Trees scattered over the area in addition to mapped ones
    pub tree_count: usize,
    pub buildings: BuildingPolicy,
    pub roads: RoadPolicy,
    pub materials: MaterialSlots,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            lat: 0.0,
            lon: 0.0,
            radius: 300.0,
            seed: DEFAULT_SEED,
            tree_count: 50,
            buildings: BuildingPolicy::default(),
            roads: RoadPolicy::default(),
            materials: MaterialSlots::default(),
        }
    }
}

impl GenerationConfig {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Defaults overlaid by environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Read `path` (or start from defaults), apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                Self::from_json(&content)?
            }
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`. Values that do not parse are ignored with a warning.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.lat = env_value(&lookup, "CITYMESH_LAT", self.lat);
        self.lon = env_value(&lookup, "CITYMESH_LON", self.lon);
        self.radius = env_value(&lookup, "CITYMESH_RADIUS", self.radius);
        self.seed = env_value(&lookup, "CITYMESH_SEED", self.seed);
        self.tree_count = env_value(&lookup, "CITYMESH_TREE_COUNT", self.tree_count);
    }

    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || self.lat.abs() > MAX_LATITUDE {
            return Err(PipelineError::Config(format!(
                "latitude {} outside ±{}",
                self.lat, MAX_LATITUDE
            )));
        }
        if !self.lon.is_finite() || self.lon.abs() > 180.0 {
            return Err(PipelineError::Config(format!("longitude {} outside ±180", self.lon)));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(PipelineError::Config(format!("radius must be positive, got {}", self.radius)));
        }

        let buildings = &self.buildings;
        if buildings.floor_height <= 0.0 {
            return Err(PipelineError::Config("buildings.floor_height must be positive".into()));
        }
        if !(0.0..=1.0).contains(&buildings.pyramid_chance) {
            return Err(PipelineError::Config("buildings.pyramid_chance must be within 0..=1".into()));
        }
        if !(buildings.setback_ratio > 0.0 && buildings.setback_ratio < 1.0) {
            return Err(PipelineError::Config("buildings.setback_ratio must be within (0, 1)".into()));
        }
        let ranges = buildings
            .height_ranges
            .iter()
            .map(|(name, range)| (name.as_str(), range))
            .chain(std::iter::once(("default", &buildings.default_range)));
        for (name, range) in ranges {
            if !(range.min > 0.0 && range.min <= range.max) {
                return Err(PipelineError::Config(format!(
                    "height range '{}' must satisfy 0 < min <= max, got {}..{}",
                    name, range.min, range.max
                )));
            }
        }

        if self.roads.default_width <= 0.0 {
            return Err(PipelineError::Config("roads.default_width must be positive".into()));
        }
        if let Some((class, width)) = self.roads.width_overrides.iter().find(|(_, w)| **w <= 0.0) {
            return Err(PipelineError::Config(format!(
                "width override for '{}' must be positive, got {}",
                class, width
            )));
        }
        Ok(())
    }
}

fn env_value<T, F>(lookup: &F, key: &str, current: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparsable environment override");
            current
        }),
        None => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citymesh_geometry::HeightRange;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = GenerationConfig::from_json(
            r#"{
                "lat": 47.3769,
                "lon": 8.5417,
                "roads": { "width_overrides": { "residential": 7.5 } },
                "buildings": { "height_ranges": { "house": { "min": 4.0, "max": 7.0 } } },
                "materials": { "building": { "wall": "brick" } }
            }"#,
        )
        .unwrap();

        assert_eq!(config.lat, 47.3769);
        assert_eq!(config.radius, 300.0);
        assert_eq!(config.seed, DEFAULT_SEED);
        assert_eq!(config.roads.class_width("residential"), 7.5);
        assert_eq!(config.roads.class_width("motorway"), 12.0);
        assert_eq!(config.buildings.range_for("house"), HeightRange::new(4.0, 7.0));
        assert_eq!(config.materials.building.wall, "brick");
        assert_eq!(config.materials.building.roof, "roof");
        assert_eq!(config.materials.platform, "platform");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = GenerationConfig::default();
        config.apply_env_from(|key| match key {
            "CITYMESH_LAT" => Some("51.5".to_string()),
            "CITYMESH_RADIUS" => Some(" 450 ".to_string()),
            "CITYMESH_SEED" => Some("not-a-number".to_string()),
            "CITYMESH_TREE_COUNT" => Some("0".to_string()),
            _ => None,
        });

        assert_eq!(config.lat, 51.5);
        assert_eq!(config.lon, 0.0);
        assert_eq!(config.radius, 450.0);
        // Unparsable value leaves the field alone
        assert_eq!(config.seed, DEFAULT_SEED);
        assert_eq!(config.tree_count, 0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = GenerationConfig { radius: 0.0, ..Default::default() };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));

        config.radius = 100.0;
        config.lat = 89.0;
        assert!(config.validate().is_err());

        config.lat = 10.0;
        config.buildings.height_ranges.insert("shed".into(), HeightRange::new(5.0, 2.0));
        assert!(config.validate().is_err());

        config.buildings.height_ranges.clear();
        config.roads.width_overrides.insert("service".into(), -1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        assert!(matches!(
            GenerationConfig::from_json("{ not json"),
            Err(PipelineError::Config(_))
        ));
    }
}
