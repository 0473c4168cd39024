// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for map-document operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a map extract
#[derive(Error, Debug)]
pub enum Error {
    /// The document as a whole could not be read. The run cannot continue.
    #[error("Parse failure: {0}")]
    ParseFailure(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A single element lacks a required attribute. Only that element is dropped.
    #[error("{kind} element is missing required attribute '{field}'")]
    MissingAttribute { kind: &'static str, field: &'static str },
}

impl Error {
    /// Whether this error aborts the whole document rather than one element
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::MissingAttribute { .. })
    }
}
