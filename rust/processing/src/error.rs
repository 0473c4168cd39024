// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline error types.

use thiserror::Error;

/// Result type for generation runs
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that end a generation run.
///
/// Per-feature geometry failures are logged and skipped inside a pass; only
/// the variants below reach the caller.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to parse map document: {0}")]
    Parse(#[from] citymesh_core::Error),

    #[error("Map source failed after {attempts} attempt(s): {message}")]
    Network { attempts: u32, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Geometry error: {0}")]
    Geometry(#[from] citymesh_geometry::Error),
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Config(err.to_string())
    }
}
