// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end generation over a small hand-written extract

use approx::assert_relative_eq;
use citymesh_core::FeatureClass;
use citymesh_geometry::MeshBuffer;
use citymesh_processing::{write_obj, AreaRequest, GenerationConfig, GenerationSession, PipelineError};

const LAT: f64 = 47.0;
const LON: f64 = 8.0;

/// Building, residential road, primary bridge, a water relation made of two
/// untagged halves, a park and one mapped tree, all within ~60 m of the center.
fn sample_document() -> String {
    let node = |id: i64, dlat: f64, dlon: f64, tags: &str| {
        format!(
            r#"{{"type":"node","id":{},"lat":{},"lon":{},"tags":{{{}}}}}"#,
            id,
            LAT + dlat,
            LON + dlon,
            tags
        )
    };
    let way = |id: i64, nodes: &str, tags: &str| {
        format!(
            r#"{{"type":"way","id":{},"nodes":[{}],"tags":{{{}}}}}"#,
            id, nodes, tags
        )
    };

    let elements = vec![
        // building
        node(1, 0.0001, 0.0001, ""),
        node(2, 0.0001, 0.0003, ""),
        node(3, 0.0003, 0.0003, ""),
        node(4, 0.0003, 0.0001, ""),
        // road
        node(5, -0.0001, -0.0004, ""),
        node(6, -0.0001, 0.0004, ""),
        // bridge
        node(7, -0.0003, -0.0003, ""),
        node(8, -0.0003, 0.0003, ""),
        // pond
        node(9, 0.0002, -0.0004, ""),
        node(10, 0.0002, -0.0002, ""),
        node(11, 0.0004, -0.0002, ""),
        node(12, 0.0004, -0.0004, ""),
        // park
        node(13, -0.0004, 0.0004, ""),
        node(14, -0.0004, 0.0005, ""),
        node(15, -0.0005, 0.0005, ""),
        node(16, -0.0005, 0.0004, ""),
        node(17, 0.0, 0.00045, r#""natural":"tree""#),
        way(100, "1,2,3,4,1", r#""building":"residential","height":"10""#),
        // node 99 does not exist and is dropped
        way(101, "5,99,6", r#""highway":"residential""#),
        way(102, "7,8", r#""highway":"primary","bridge":"yes""#),
        way(103, "9,10,11", ""),
        way(104, "11,12,9", ""),
        way(105, "13,14,15,16,13", r#""leisure":"park""#),
        r#"{"type":"relation","id":200,"members":[{"type":"way","ref":103,"role":"outer"},{"type":"way","ref":104,"role":"outer"}],"tags":{"type":"multipolygon","natural":"water"}}"#.to_string(),
        // no id: skipped
        r#"{"type":"node","lat":47.0,"lon":8.0}"#.to_string(),
    ];

    format!(r#"{{"elements":[{}]}}"#, elements.join(","))
}

fn config(tree_count: usize) -> GenerationConfig {
    GenerationConfig {
        lat: LAT,
        lon: LON,
        radius: 80.0,
        tree_count,
        ..Default::default()
    }
}

fn count(meshes: &[MeshBuffer], class: FeatureClass) -> usize {
    meshes.iter().filter(|m| m.class == class).count()
}

#[test]
fn test_sample_extract_produces_every_class() {
    let mut session = GenerationSession::new(config(5));
    let output = session.generate(&sample_document()).unwrap();
    let meshes = &output.meshes;

    assert_eq!(count(meshes, FeatureClass::Building), 1);
    assert_eq!(count(meshes, FeatureClass::Road), 1);
    assert_eq!(count(meshes, FeatureClass::Bridge), 1);
    assert_eq!(count(meshes, FeatureClass::WaterArea), 1);
    assert_eq!(count(meshes, FeatureClass::ParkArea), 1);
    assert_eq!(count(meshes, FeatureClass::Platform), 1);
    // One mapped tree plus the scatter, which may fall short
    let trees = count(meshes, FeatureClass::Tree);
    assert!((2..=6).contains(&trees), "{} trees", trees);

    let stats = &output.stats;
    assert_eq!(stats.synthetic_ways, 1);
    assert_eq!(stats.skipped_elements, 1);
    assert_eq!(stats.failed_features, 0);
    assert_eq!(stats.total_meshes, meshes.len());
    assert_eq!(
        stats.total_triangles,
        meshes.iter().map(|m| m.triangle_count()).sum::<usize>()
    );

    for mesh in meshes {
        assert!(mesh.validate().is_ok(), "{} mesh invalid", mesh.class);
        assert!(!mesh.is_empty());
    }

    // Two endpoints per road or bridge
    assert_eq!(session.endpoints().len(), 4);
}

#[test]
fn test_local_coordinates_stay_near_origin() {
    let mut session = GenerationSession::new(config(0));
    let output = session.generate(&sample_document()).unwrap();

    for mesh in &output.meshes {
        let (min, max) = mesh.bounds();
        for v in [min.x, min.y, max.x, max.y] {
            assert!(v.abs() < 200.0, "{} mesh reaches {}", mesh.class, v);
        }
    }

    let bridge = output.meshes.iter().find(|m| m.class == FeatureClass::Bridge).unwrap();
    let (_, max) = bridge.bounds();
    assert!(max.z > 6.0);

    // 80 m radius: 1.6 m thick, ground level at z = 0
    let platform = output.meshes.last().unwrap();
    assert_eq!(platform.class, FeatureClass::Platform);
    let (min, max) = platform.bounds();
    assert_relative_eq!(max.z, 0.0);
    assert_relative_eq!(min.z, -1.6, epsilon = 1e-5);
    assert_relative_eq!(max.x, 81.6, epsilon = 1e-4);
}

#[test]
fn test_same_seed_same_output() {
    let document = sample_document();
    let a = GenerationSession::new(config(10)).generate(&document).unwrap();
    let b = GenerationSession::new(config(10)).generate(&document).unwrap();

    assert_eq!(a.meshes.len(), b.meshes.len());
    for (x, y) in a.meshes.iter().zip(&b.meshes) {
        assert_eq!(x.class, y.class);
        assert_eq!(x.positions, y.positions);
        assert_eq!(x.submeshes, y.submeshes);
    }
}

#[test]
fn test_different_seed_moves_scattered_trees() {
    let document = sample_document();
    let a = GenerationSession::new(config(10)).generate(&document).unwrap();
    let b = GenerationSession::new(GenerationConfig { seed: 7, ..config(10) })
        .generate(&document)
        .unwrap();

    let trees = |meshes: &[MeshBuffer]| -> Vec<Vec<f32>> {
        meshes
            .iter()
            .filter(|m| m.class == FeatureClass::Tree)
            .map(|m| m.positions.clone())
            .collect()
    };
    assert_ne!(trees(&a.meshes), trees(&b.meshes));
}

#[test]
fn test_repeated_passes_reset_session_state() {
    let document = sample_document();
    let mut session = GenerationSession::new(config(3));

    let first = session.generate(&document).unwrap();
    let first_endpoints = session.endpoints().len();
    let second = session.generate(&document).unwrap();

    assert_eq!(session.endpoints().len(), first_endpoints);
    assert_eq!(first.meshes.len(), second.meshes.len());
    for (x, y) in first.meshes.iter().zip(&second.meshes) {
        assert_eq!(x.positions, y.positions);
    }

    session.reset();
    assert!(session.endpoints().is_empty());
    assert!(session.projector().origin().is_none());
}

#[test]
fn test_building_colour_gets_own_slot() {
    let document = r#"{"elements":[
        {"type":"node","id":1,"lat":47.0001,"lon":8.0001},
        {"type":"node","id":2,"lat":47.0001,"lon":8.0003},
        {"type":"node","id":3,"lat":47.0003,"lon":8.0003},
        {"type":"node","id":4,"lat":47.0003,"lon":8.0001},
        {"type":"way","id":1,"nodes":[1,2,3,4,1],"tags":{"building":"office","building:colour":"red"}}
    ]}"#;

    let mut session = GenerationSession::new(config(0));
    let output = session.generate(document).unwrap();
    let building = output.meshes.iter().find(|m| m.class == FeatureClass::Building).unwrap();

    assert!(building.submesh("wall#ff0000").is_some());
    assert_eq!(session.materials().slots(), vec!["wall#ff0000".to_string()]);
}

#[test]
fn test_malformed_document_fails_the_pass() {
    let mut session = GenerationSession::new(config(0));
    let err = session.generate(r#"{"nodes": []}"#).unwrap_err();
    assert!(matches!(err, PipelineError::Parse(_)));
}

#[test]
fn test_generate_from_retries_narrower_area() {
    let document = sample_document();
    let source = |request: &AreaRequest| {
        if request.radius > 50.0 {
            Err(PipelineError::Network {
                attempts: 1,
                message: "area too large".into(),
            })
        } else {
            Ok(document.clone())
        }
    };

    let mut session = GenerationSession::new(config(0));
    let output = session.generate_from(&source).unwrap();
    assert_eq!(count(&output.meshes, FeatureClass::Building), 1);
}

#[test]
fn test_obj_export_of_a_pass() {
    let mut session = GenerationSession::new(config(2));
    let output = session.generate(&sample_document()).unwrap();

    let mut buffer = Vec::new();
    write_obj(&mut buffer, &output.meshes).unwrap();
    let text = String::from_utf8(buffer).unwrap();

    let groups = text.lines().filter(|l| l.starts_with("o ")).count();
    assert_eq!(groups, output.meshes.len());
    let vertices = text.lines().filter(|l| l.starts_with("v ")).count();
    assert_eq!(vertices, output.stats.total_vertices);
    assert!(text.contains("usemtl platform"));
    assert!(text.contains("usemtl deck"));
    assert!(text.contains("usemtl water"));
}
