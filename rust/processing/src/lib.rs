// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # CityMesh Processing
//!
//! Runs whole generation passes on top of `citymesh-core` and
//! `citymesh-geometry`:
//!
//! - [`GenerationConfig`]: JSON configuration with environment overrides
//! - [`GenerationSession`]: parse, classify, project and extrude in parallel
//! - [`MapSource`] / [`fetch_document`]: document retrieval with one narrower retry
//! - [`export::write_obj`]: Wavefront OBJ output
//!
//! ```rust,ignore
//! use citymesh_processing::{GenerationConfig, GenerationSession};
//!
//! let config = GenerationConfig::load(Some("citymesh.json".as_ref()))?;
//! let mut session = GenerationSession::new(config);
//! let output = session.generate(&std::fs::read_to_string("extract.json")?)?;
//! println!("{} meshes", output.meshes.len());
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod source;

pub use config::{GenerationConfig, MaterialSlots};
pub use error::{PipelineError, Result};
pub use export::{write_obj, write_obj_file};
pub use pipeline::{GenerationOutput, GenerationSession, GenerationStats};
pub use source::{fetch_document, AreaRequest, FileSource, MapSource};
