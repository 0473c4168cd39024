// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Concave and messy footprints through triangulation and extrusion

use citymesh_core::tags_from;
use citymesh_geometry::{
    polygon_area, signed_area, triangulate, BuildingExtruder, BuildingPolicy, BuildingSlots,
    EndpointRegistry, MaterialCache, Point2, RoadExtruder, RoadPolicy, RoadSlots,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn ring(coords: &[(f64, f64)]) -> Vec<Point2<f64>> {
    coords.iter().map(|&(x, y)| Point2::new(x, y)).collect()
}

fn gallery() -> Vec<(&'static str, Vec<Point2<f64>>)> {
    vec![
        ("l-shape", ring(&[(0.0, 0.0), (20.0, 0.0), (20.0, 8.0), (8.0, 8.0), (8.0, 20.0), (0.0, 20.0)])),
        (
            "u-shape",
            ring(&[
                (0.0, 0.0),
                (24.0, 0.0),
                (24.0, 18.0),
                (16.0, 18.0),
                (16.0, 6.0),
                (8.0, 6.0),
                (8.0, 18.0),
                (0.0, 18.0),
            ]),
        ),
        (
            "t-shape",
            ring(&[
                (0.0, 12.0),
                (8.0, 12.0),
                (8.0, 0.0),
                (16.0, 0.0),
                (16.0, 12.0),
                (24.0, 12.0),
                (24.0, 20.0),
                (0.0, 20.0),
            ]),
        ),
        // Clockwise, closed, with a duplicated vertex, the way raw ways arrive
        (
            "raw-clockwise",
            ring(&[(0.0, 0.0), (0.0, 15.0), (0.0, 15.0), (12.0, 15.0), (12.0, 0.0), (0.0, 0.0)]),
        ),
    ]
}

fn triangle_area_sum(points: &[Point2<f64>], indices: &[usize]) -> f64 {
    indices
        .chunks_exact(3)
        .map(|t| signed_area(&[points[t[0]], points[t[1]], points[t[2]]]))
        .sum()
}

#[test]
fn test_concave_rings_triangulate_exactly() {
    for (name, points) in gallery().into_iter().take(3) {
        let indices = triangulate(&points).unwrap();
        assert_eq!(indices.len() / 3, points.len() - 2, "{}", name);
        assert!(indices.iter().all(|&i| i < points.len()), "{}", name);

        let covered = triangle_area_sum(&points, &indices);
        assert!((covered - polygon_area(&points)).abs() < 1e-9, "{}: {}", name, covered);
    }
}

#[test]
fn test_gallery_buildings_are_valid() {
    let policy = BuildingPolicy::default();
    let slots = BuildingSlots::default();
    let materials = MaterialCache::new();
    let extruder = BuildingExtruder::new(&policy, &slots, &materials);
    let tags = tags_from([("building", "commercial"), ("height", "12")]);

    for (name, footprint) in gallery() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mesh = extruder
            .build(&footprint, &tags, &mut rng)
            .unwrap()
            .unwrap_or_else(|| panic!("{} skipped", name));

        assert!(mesh.validate().is_ok(), "{}", name);
        assert!(mesh.slot_triangle_count("roof") >= 2, "{}", name);

        let (min, max) = mesh.bounds();
        assert!(min.z >= 0.0, "{}", name);
        // Flat roof of a 12 m building carries a 1 m parapet
        assert!((max.z - 13.0).abs() < 1e-4, "{}: {}", name, max.z);
    }
    assert!(materials.is_empty());
}

#[test]
fn test_road_network_endpoints_collect_in_order() {
    let policy = RoadPolicy::default();
    let slots = RoadSlots::default();
    let extruder = RoadExtruder::new(&policy, &slots);

    let streets = [
        (ring(&[(0.0, 0.0), (50.0, 0.0)]), "primary"),
        (ring(&[(50.0, 0.0), (50.0, 40.0), (80.0, 60.0)]), "residential"),
        (ring(&[(50.0, 0.0), (90.0, -10.0)]), "service"),
    ];

    let mut registry = EndpointRegistry::new();
    for (path, class) in &streets {
        let output = extruder.build(path, &tags_from([("highway", *class)])).unwrap().unwrap();
        assert!(output.mesh.validate().is_ok());
        registry.extend(output.endpoints);
    }

    assert_eq!(registry.len(), 6);
    let at_junction = registry
        .endpoints()
        .iter()
        .filter(|e| (e.position - Point2::new(50.0, 0.0)).norm() < 1e-6)
        .count();
    assert_eq!(at_junction, 3);
    assert_eq!(registry.endpoints()[0].width, 10.0);
    assert_eq!(registry.endpoints()[2].class, "residential");
}
