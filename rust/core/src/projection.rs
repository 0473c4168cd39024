// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geographic projection with a floating origin
//!
//! Spherical Mercator coordinates near a city are in the millions of meters.
//! Converting those directly to f32 vertex positions loses about a meter of
//! precision, so every point is re-based against a session origin in f64
//! before it reaches the mesh builders.

use nalgebra::{Point2, Vector2};

/// Earth radius used by spherical (web) Mercator, in meters
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Projects lat/lon into local planar meters (X east, Y north)
#[derive(Debug, Clone, Default)]
pub struct GeoProjector {
    origin: Option<Point2<f64>>,
}

impl GeoProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a projector with its origin already set
    pub fn with_origin(lat: f64, lon: f64) -> Self {
        let mut projector = Self::new();
        projector.set_origin(lat, lon);
        projector
    }

    /// Spherical Mercator projection; pure and deterministic
    #[inline]
    pub fn to_planar(lat: f64, lon: f64) -> Point2<f64> {
        let x = EARTH_RADIUS * lon.to_radians();
        let y = EARTH_RADIUS * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
        Point2::new(x, y)
    }

    /// Use the projection of (lat, lon) as origin. Replaces any previous origin.
    pub fn set_origin(&mut self, lat: f64, lon: f64) {
        self.origin = Some(Self::to_planar(lat, lon));
    }

    /// Current origin in planar meters
    #[inline]
    pub fn origin(&self) -> Option<Point2<f64>> {
        self.origin
    }

    /// Project relative to the origin.
    ///
    /// Without an origin this call's point becomes the origin, so the first
    /// projected point of a session lands on (0, 0).
    pub fn to_local(&mut self, lat: f64, lon: f64) -> Point2<f64> {
        let planar = Self::to_planar(lat, lon);
        let origin = match self.origin {
            Some(origin) => origin,
            None => {
                tracing::info!(lat, lon, "No projection origin set, using first projected point");
                self.origin = Some(planar);
                planar
            }
        };
        Point2::from(planar - origin)
    }

    /// Project relative to an already-set origin without mutating the projector
    #[inline]
    pub fn local_offset(&self, lat: f64, lon: f64) -> Option<Vector2<f64>> {
        self.origin.map(|o| Self::to_planar(lat, lon) - o)
    }

    /// Forget the origin
    pub fn reset(&mut self) {
        self.origin = None;
    }
}
