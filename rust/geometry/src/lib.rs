// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CityMesh Geometry Processing
//!
//! Planar polygon and path operations plus the per-feature extruders that
//! turn projected map features into [`MeshBuffer`]s, using nalgebra for the
//! math and ear clipping (with a convex-hull fallback) for triangulation.
//!
//! Randomised choices (untagged heights, roof forms, tree shapes) take the
//! caller's RNG; [`SeedSource`] derives one per feature so results do not
//! depend on processing order.

pub mod area;
pub mod building;
pub mod error;
pub mod extrusion;
pub mod material;
pub mod mesh;
pub mod path;
pub mod platform;
pub mod polygon;
pub mod primitives;
pub mod ribbon;
pub mod rng;
pub mod road;
pub mod tree;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2, Vector3};

pub use area::{AreaExtruder, AreaSlots};
pub use building::{
    BuildingExtruder, BuildingPlan, BuildingPolicy, BuildingSlots, HeightRange, HeightSource, RoofForm,
};
pub use error::{Error, Result};
pub use material::{parse_colour, MaterialCache};
pub use mesh::{MeshBuffer, SubMesh};
pub use platform::{platform_height, PlatformBuilder};
pub use polygon::{area as polygon_area, erode, normalize_ring, signed_area, Bounds2};
pub use rng::{SeedSource, Stream};
pub use road::{
    BridgeExtruder, Endpoint, EndpointRegistry, RoadExtruder, RoadPolicy, RoadSlots, StripOutput,
};
pub use tree::{scatter, CanopyVariant, TreeSlots, TreeSynthesizer};
pub use triangulation::{triangulate, triangulate_or_hull, Triangulation};
