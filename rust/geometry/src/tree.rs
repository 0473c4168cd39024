// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tree synthesis and scattering
//!
//! A tree is a tapered trunk plus one of three canopy shapes. All
//! dimensions come from the ranges below, drawn from the caller's RNG.
//!
//! | part | range |
//! |---|---|
//! | trunk height | 2 – 4 m |
//! | trunk radius | 0.2 – 0.35 m, top at 60 % |
//! | sphere canopy radius | 1.5 – 3 m |
//! | stacked cones | 2 – 4 cones, base radius 2 – 3 m |
//! | blobs | 2 – 4 ellipsoids, horizontal radius 1.5 – 2.5 m, vertical 0.8 – 1.3 m |

use crate::mesh::MeshBuffer;
use crate::polygon::Bounds2;
use crate::primitives::{add_cone, add_cylinder, add_ellipsoid};
use citymesh_core::FeatureClass;
use nalgebra::{Point2, Point3, Vector3};
use rand::Rng;
use std::f64::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const TRUNK_SEGMENTS: usize = 8;
const CANOPY_SEGMENTS: usize = 12;
const CANOPY_RINGS: usize = 6;
const TRUNK_TAPER: f64 = 0.6;

/// Maximum placement attempts per requested tree
pub const SCATTER_ATTEMPTS_PER_TREE: usize = 4;

/// Material slot ids for trees
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct TreeSlots {
    pub trunk: String,
    pub foliage: String,
}

impl Default for TreeSlots {
    fn default() -> Self {
        Self {
            trunk: "trunk".to_string(),
            foliage: "foliage".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanopyVariant {
    Sphere,
    Cones,
    Blobs,
}

impl CanopyVariant {
    pub const ALL: [CanopyVariant; 3] = [CanopyVariant::Sphere, CanopyVariant::Cones, CanopyVariant::Blobs];
}

pub struct TreeSynthesizer<'a> {
    slots: &'a TreeSlots,
}

impl<'a> TreeSynthesizer<'a> {
    pub fn new(slots: &'a TreeSlots) -> Self {
        Self { slots }
    }

    /// Tree at `position` with a randomly chosen canopy
    pub fn build<R: Rng + ?Sized>(&self, position: Point2<f64>, rng: &mut R) -> MeshBuffer {
        let variant = CanopyVariant::ALL[rng.gen_range(0..CanopyVariant::ALL.len())];
        self.build_variant(position, variant, rng)
    }

    pub fn build_variant<R: Rng + ?Sized>(&self, position: Point2<f64>, variant: CanopyVariant, rng: &mut R) -> MeshBuffer {
        let mut mesh = MeshBuffer::new(FeatureClass::Tree);
        let trunk = mesh.slot(&self.slots.trunk);
        let foliage = mesh.slot(&self.slots.foliage);

        let trunk_height: f64 = rng.gen_range(2.0..=4.0);
        let trunk_radius: f64 = rng.gen_range(0.2..=0.35);
        let base = Point3::new(position.x, position.y, 0.0);
        add_cylinder(
            &mut mesh,
            trunk,
            base,
            trunk_radius,
            trunk_radius * TRUNK_TAPER,
            trunk_height,
            TRUNK_SEGMENTS,
        );

        let top = Point3::new(position.x, position.y, trunk_height);
        match variant {
            CanopyVariant::Sphere => {
                let r: f64 = rng.gen_range(1.5..=3.0);
                let center = top + Vector3::new(0.0, 0.0, r * 0.7);
                add_ellipsoid(&mut mesh, foliage, center, Vector3::repeat(r), CANOPY_RINGS, CANOPY_SEGMENTS);
            }
            CanopyVariant::Cones => {
                let count: usize = rng.gen_range(2..=4);
                let mut radius: f64 = rng.gen_range(2.0..=3.0);
                // Lowest cone starts a little below the trunk top
                let mut z = trunk_height * 0.8;
                for _ in 0..count {
                    let height = radius * 1.6;
                    add_cone(&mut mesh, foliage, Point3::new(position.x, position.y, z), radius, height, CANOPY_SEGMENTS);
                    z += height * 0.45;
                    radius *= 0.75;
                }
            }
            CanopyVariant::Blobs => {
                let count: usize = rng.gen_range(2..=4);
                for _ in 0..count {
                    let horizontal: f64 = rng.gen_range(1.5..=2.5);
                    let vertical: f64 = rng.gen_range(0.8..=1.3);
                    let offset = Vector3::new(
                        rng.gen_range(-1.0..=1.0),
                        rng.gen_range(-1.0..=1.0),
                        rng.gen_range(0.0..=1.0f64) + vertical * 0.5,
                    );
                    add_ellipsoid(
                        &mut mesh,
                        foliage,
                        top + offset,
                        Vector3::new(horizontal, horizontal, vertical),
                        CANOPY_RINGS,
                        CANOPY_SEGMENTS,
                    );
                }
            }
        }

        mesh
    }
}

/// Area-uniform positions in a disk, skipping any inside `exclusions`.
///
/// Makes at most `SCATTER_ATTEMPTS_PER_TREE · count` attempts, so a mostly
/// built-up disk yields fewer than `count` trees instead of spinning.
pub fn scatter<R: Rng + ?Sized>(
    center: Point2<f64>,
    radius: f64,
    count: usize,
    exclusions: &[Bounds2],
    rng: &mut R,
) -> Vec<Point2<f64>> {
    let mut placed = Vec::with_capacity(count);
    let max_attempts = count * SCATTER_ATTEMPTS_PER_TREE;
    let mut attempts = 0;

    while placed.len() < count && attempts < max_attempts {
        attempts += 1;
        let angle = rng.gen_range(0.0..TAU);
        let r = radius * rng.gen::<f64>().sqrt();
        let p = Point2::new(center.x + r * angle.cos(), center.y + r * angle.sin());
        if exclusions.iter().any(|b| b.contains(&p)) {
            continue;
        }
        placed.push(p);
    }

    if placed.len() < count {
        tracing::debug!(placed = placed.len(), requested = count, attempts, "Tree scatter ran out of attempts");
    }
    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_every_variant_is_a_closed_tree() {
        let slots = TreeSlots::default();
        let synth = TreeSynthesizer::new(&slots);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        for variant in CanopyVariant::ALL {
            let mesh = synth.build_variant(Point2::new(10.0, -4.0), variant, &mut rng);
            assert_eq!(mesh.class, FeatureClass::Tree);
            assert_eq!(mesh.slot_triangle_count("trunk"), TRUNK_SEGMENTS * 4);
            assert!(mesh.slot_triangle_count("foliage") > 0);
            assert!(mesh.signed_volume() > 0.0, "{:?}", variant);
            assert!(mesh.validate().is_ok());

            let (min, max) = mesh.bounds();
            assert!(min.z >= 0.0);
            assert!(max.z > 2.0);
        }
    }

    #[test]
    fn test_same_seed_same_tree() {
        let slots = TreeSlots::default();
        let synth = TreeSynthesizer::new(&slots);
        let a = synth.build(Point2::origin(), &mut ChaCha8Rng::seed_from_u64(11));
        let b = synth.build(Point2::origin(), &mut ChaCha8Rng::seed_from_u64(11));
        assert_eq!(a.positions, b.positions);
    }

    #[test]
    fn test_scatter_stays_in_disk() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let center = Point2::new(100.0, 50.0);
        let trees = scatter(center, 30.0, 200, &[], &mut rng);
        assert_eq!(trees.len(), 200);
        assert!(trees.iter().all(|p| (p - center).norm() <= 30.0));
    }

    #[test]
    fn test_scatter_avoids_buildings() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let building = Bounds2 {
            min: Point2::new(-10.0, -10.0),
            max: Point2::new(0.0, 10.0),
        };
        let trees = scatter(Point2::origin(), 10.0, 50, &[building], &mut rng);
        assert!(!trees.is_empty());
        assert!(trees.iter().all(|p| !building.contains(p)));

        // Nothing fits, attempts run out
        let everything = Bounds2 {
            min: Point2::new(-20.0, -20.0),
            max: Point2::new(20.0, 20.0),
        };
        assert!(scatter(Point2::origin(), 10.0, 50, &[everything], &mut rng).is_empty());
    }
}
