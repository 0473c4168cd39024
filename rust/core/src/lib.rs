// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # CityMesh Core
//!
//! Map-extract model and the steps that run before any geometry is built:
//!
//! - **Parsing**: element-list documents into an [`OsmGraph`]
//! - **Multipolygon assembly**: water relations chained into closed rings
//! - **Projection**: lat/lon to local meters with a floating origin
//! - **Classification**: tag-based dispatch of ways to feature kinds
//! - **Units**: length tags (`height`, `width`) converted to meters
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use citymesh_core::{parse_document, assemble_water_relations, classify, GeoProjector};
//!
//! let mut graph = parse_document(&content)?;
//! assemble_water_relations(&mut graph);
//!
//! let mut projector = GeoProjector::with_origin(47.3769, 8.5417);
//! for way in graph.ways.values() {
//!     if let Some(kind) = classify(way) {
//!         let local: Vec<_> = graph
//!             .way_points(way)
//!             .iter()
//!             .map(|p| projector.to_local(p.lat, p.lon))
//!             .collect();
//!         println!("{:?}: {} points", kind, local.len());
//!     }
//! }
//! ```

pub mod classify;
pub mod error;
pub mod graph;
pub mod model;
pub mod parser;
pub mod projection;
pub mod relation;
pub mod units;

pub use classify::{classify, is_bridge, FeatureClass, FeatureKind};
pub use error::{Error, Result};
pub use graph::OsmGraph;
pub use model::{tags_from, ElementId, GeoPoint, Member, MemberType, Relation, Tags, Way};
pub use parser::parse_document;
pub use projection::{GeoProjector, EARTH_RADIUS};
pub use relation::{assemble_water_relations, chain_fragments, is_water_bearing};
pub use units::parse_length;
