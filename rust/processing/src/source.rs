// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Map document sources.
//!
//! Transport is left to [`MapSource`] implementations. This module only
//! shapes the request and applies the retry policy: one coarse request,
//! then a single retry over half the radius.

use crate::config::GenerationConfig;
use crate::error::{PipelineError, Result};
use std::fmt::Write as _;
use std::path::PathBuf;

/// Attempts made by [`fetch_document`] before giving up
pub const FETCH_ATTEMPTS: u32 = 2;

/// Circular area around a center point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaRequest {
    pub lat: f64,
    pub lon: f64,
    /// Meters
    pub radius: f64,
}

impl AreaRequest {
    pub fn new(lat: f64, lon: f64, radius: f64) -> Self {
        Self { lat, lon, radius }
    }

    /// Same center, half the radius
    pub fn narrowed(&self) -> Self {
        Self {
            radius: self.radius / 2.0,
            ..*self
        }
    }

    /// Overpass QL selecting everything the classifier can turn into geometry,
    /// followed by the referenced nodes.
    pub fn overpass_query(&self) -> String {
        let around = format!("(around:{:.0},{:.6},{:.6})", self.radius, self.lat, self.lon);
        let selectors = [
            r#"way["building"]"#,
            r#"way["building:part"]"#,
            r#"way["highway"]"#,
            r#"way["natural"~"^(water|wetland|bay|strait|wood|scrub|grassland|heath)$"]"#,
            r#"way["waterway"]"#,
            r#"way["water"]"#,
            r#"way["landuse"]"#,
            r#"way["leisure"]"#,
            r#"relation["natural"="water"]"#,
            r#"relation["waterway"]"#,
            r#"relation["water"]"#,
            r#"relation["landuse"~"^(reservoir|basin)$"]"#,
            r#"node["natural"="tree"]"#,
        ];

        let mut query = String::from("[out:json][timeout:60];\n(\n");
        for selector in selectors {
            // Writing to a String cannot fail
            let _ = writeln!(query, "  {}{};", selector, around);
        }
        query.push_str(");\nout body;\n>;\nout skel qt;\n");
        query
    }
}

impl From<&GenerationConfig> for AreaRequest {
    fn from(config: &GenerationConfig) -> Self {
        Self::new(config.lat, config.lon, config.radius)
    }
}

/// Something that can hand back a map document for an area
pub trait MapSource {
    fn fetch(&self, request: &AreaRequest) -> Result<String>;
}

impl<F> MapSource for F
where
    F: Fn(&AreaRequest) -> Result<String>,
{
    fn fetch(&self, request: &AreaRequest) -> Result<String> {
        self(request)
    }
}

/// A document already on disk; the request is ignored
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MapSource for FileSource {
    fn fetch(&self, _request: &AreaRequest) -> Result<String> {
        Ok(std::fs::read_to_string(&self.path)?)
    }
}

/// Fetch with a single narrower retry. A second failure is fatal.
pub fn fetch_document(source: &dyn MapSource, request: &AreaRequest) -> Result<String> {
    match source.fetch(request) {
        Ok(document) => Ok(document),
        Err(first) => {
            let narrower = request.narrowed();
            tracing::warn!(
                error = %first,
                radius = narrower.radius,
                "Map fetch failed, retrying with a narrower area"
            );
            source.fetch(&narrower).map_err(|err| PipelineError::Network {
                attempts: FETCH_ATTEMPTS,
                message: err.to_string(),
            })
        }
    }
}
