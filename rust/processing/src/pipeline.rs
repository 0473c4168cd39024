// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Generation pass: map document in, mesh buffers out.

use crate::config::GenerationConfig;
use crate::error::Result;
use crate::source::{fetch_document, AreaRequest, MapSource};
use citymesh_core::{
    assemble_water_relations, classify, parse_document, ElementId, FeatureClass, FeatureKind, GeoProjector,
    OsmGraph, Tags,
};
use citymesh_geometry::{
    scatter, AreaExtruder, Bounds2, BridgeExtruder, BuildingExtruder, EndpointRegistry, MaterialCache, MeshBuffer,
    PlatformBuilder, Point2, RoadExtruder, SeedSource, StripOutput, Stream, TreeSynthesizer,
};
use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;

/// Counts and timings of one pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationStats {
    pub buildings: usize,
    pub roads: usize,
    pub bridges: usize,
    pub water_areas: usize,
    pub park_areas: usize,
    pub trees: usize,
    pub total_meshes: usize,
    pub total_vertices: usize,
    pub total_triangles: usize,
    /// Classified features that produced nothing (too small, degenerate)
    pub skipped_features: usize,
    /// Features whose extrusion returned an error
    pub failed_features: usize,
    /// Elements the parser dropped
    pub skipped_elements: usize,
    /// Closed ways assembled from water relations
    pub synthetic_ways: usize,
    pub parse_time_ms: u64,
    pub geometry_time_ms: u64,
    pub total_time_ms: u64,
}

/// Result of a generation pass
#[derive(Debug, Clone, Default)]
pub struct GenerationOutput {
    pub meshes: Vec<MeshBuffer>,
    pub stats: GenerationStats,
}

/// A classified way with its projected points
struct FeatureJob<'g> {
    id: ElementId,
    kind: FeatureKind,
    tags: &'g Tags,
    points: Vec<Point2<f64>>,
}

enum Built {
    Building { mesh: MeshBuffer, bounds: Option<Bounds2> },
    Strip(StripOutput),
    Area(MeshBuffer),
}

/// Extruders for one pass, borrowed from the session
struct Builders<'s> {
    building: BuildingExtruder<'s>,
    road: RoadExtruder<'s>,
    bridge: BridgeExtruder<'s>,
    area: AreaExtruder<'s>,
    seeds: SeedSource,
}

impl Builders<'_> {
    fn build(&self, job: &FeatureJob<'_>) -> citymesh_geometry::Result<Option<Built>> {
        Ok(match job.kind {
            FeatureKind::Building => {
                let mut rng = self.seeds.rng(Stream::Building, job.id);
                self.building.build(&job.points, job.tags, &mut rng)?.map(|mesh| Built::Building {
                    mesh,
                    bounds: Bounds2::from_points(&job.points),
                })
            }
            FeatureKind::Road => self.road.build(&job.points, job.tags)?.map(Built::Strip),
            FeatureKind::Bridge => self.bridge.build(&job.points, job.tags)?.map(Built::Strip),
            FeatureKind::Water | FeatureKind::Park => self.area.build(&job.points, job.kind)?.map(Built::Area),
        })
    }
}

/// Owns the state that survives between passes: the endpoint registry, the
/// material cache and the projector. Each pass starts with [`reset`].
///
/// [`reset`]: GenerationSession::reset
#[derive(Debug)]
pub struct GenerationSession {
    config: GenerationConfig,
    materials: MaterialCache,
    endpoints: EndpointRegistry,
    seeds: SeedSource,
    projector: GeoProjector,
}

impl GenerationSession {
    pub fn new(config: GenerationConfig) -> Self {
        let seeds = SeedSource::new(config.seed);
        Self {
            config,
            materials: MaterialCache::new(),
            endpoints: EndpointRegistry::new(),
            seeds,
            projector: GeoProjector::new(),
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Road and bridge endpoints of the last pass, in feature order
    pub fn endpoints(&self) -> &EndpointRegistry {
        &self.endpoints
    }

    pub fn materials(&self) -> &MaterialCache {
        &self.materials
    }

    pub fn projector(&self) -> &GeoProjector {
        &self.projector
    }

    /// Clear all per-pass state
    pub fn reset(&mut self) {
        self.endpoints.clear();
        self.materials.reset();
        self.projector.reset();
    }

    /// Fetch the configured area from `source` and generate it
    pub fn generate_from(&mut self, source: &dyn MapSource) -> Result<GenerationOutput> {
        let request = AreaRequest::from(&self.config);
        let document = fetch_document(source, &request)?;
        self.generate(&document)
    }

    /// Parse and generate. A document that cannot be parsed fails the pass;
    /// callers that want a platform anyway can run
    /// [`generate_graph`](Self::generate_graph) on an empty graph.
    pub fn generate(&mut self, document: &str) -> Result<GenerationOutput> {
        tracing::info!(content_size = document.len(), "Starting map generation");
        let start = Instant::now();
        let graph = parse_document(document)?;
        let parse_time = start.elapsed();
        tracing::info!(
            parse_time_ms = parse_time.as_millis() as u64,
            nodes = graph.nodes.len(),
            ways = graph.ways.len(),
            relations = graph.relations.len(),
            "Parse phase complete"
        );

        let mut output = self.generate_graph(graph);
        output.stats.parse_time_ms = parse_time.as_millis() as u64;
        output.stats.total_time_ms = start.elapsed().as_millis() as u64;
        Ok(output)
    }

    /// Run one pass over an already parsed graph
    pub fn generate_graph(&mut self, mut graph: OsmGraph) -> GenerationOutput {
        let start = Instant::now();
        self.reset();

        let mut stats = GenerationStats {
            skipped_elements: graph.skipped_elements,
            synthetic_ways: assemble_water_relations(&mut graph),
            ..Default::default()
        };

        self.projector.set_origin(self.config.lat, self.config.lon);

        let Self {
            config,
            materials,
            endpoints,
            seeds,
            projector,
        } = self;
        let project = |lat: f64, lon: f64| projector.local_offset(lat, lon).map(Point2::from);

        let jobs: Vec<FeatureJob<'_>> = graph
            .ways
            .values()
            .filter_map(|way| {
                let kind = classify(way)?;
                let points = graph
                    .way_points(way)
                    .iter()
                    .filter_map(|p| project(p.lat, p.lon))
                    .collect();
                Some(FeatureJob {
                    id: way.id,
                    kind,
                    tags: &way.tags,
                    points,
                })
            })
            .collect();
        tracing::debug!(features = jobs.len(), "Classified ways");

        let builders = Builders {
            building: BuildingExtruder::new(&config.buildings, &config.materials.building, materials),
            road: RoadExtruder::new(&config.roads, &config.materials.road),
            bridge: BridgeExtruder::new(&config.roads, &config.materials.road),
            area: AreaExtruder::new(&config.materials.area),
            seeds: *seeds,
        };

        let results: Vec<_> = jobs.par_iter().map(|job| builders.build(job)).collect();

        let mut meshes = Vec::with_capacity(results.len());
        let mut footprints = Vec::new();
        for (job, result) in jobs.iter().zip(results) {
            match result {
                Ok(Some(Built::Building { mesh, bounds })) => {
                    footprints.extend(bounds);
                    meshes.push(mesh);
                }
                Ok(Some(Built::Strip(strip))) => {
                    endpoints.extend(strip.endpoints);
                    meshes.push(strip.mesh);
                }
                Ok(Some(Built::Area(mesh))) => meshes.push(mesh),
                Ok(None) => {
                    tracing::debug!(id = job.id, kind = ?job.kind, "Feature produced no geometry");
                    stats.skipped_features += 1;
                }
                Err(err) => {
                    tracing::warn!(id = job.id, kind = ?job.kind, error = %err, "Feature extrusion failed");
                    stats.failed_features += 1;
                }
            }
        }

        // Mapped trees keep their node id; scattered ones get negative ids
        let mut tree_sites: Vec<(ElementId, Point2<f64>)> = graph
            .tagged_nodes()
            .filter(|(_, tags)| tags.get("natural").map(String::as_str) == Some("tree"))
            .filter_map(|(node, _)| Some((node.id, project(node.lat, node.lon)?)))
            .collect();
        let mut scatter_rng = seeds.rng(Stream::Scatter, 0);
        let scattered = scatter(Point2::origin(), config.radius, config.tree_count, &footprints, &mut scatter_rng);
        tree_sites.extend(scattered.into_iter().enumerate().map(|(i, p)| (-(i as ElementId) - 1, p)));

        let synthesizer = TreeSynthesizer::new(&config.materials.tree);
        let seeds = *seeds;
        let trees: Vec<MeshBuffer> = tree_sites
            .par_iter()
            .map(|&(id, position)| synthesizer.build(position, &mut seeds.rng(Stream::Tree, id)))
            .collect();
        meshes.extend(trees);

        meshes.push(PlatformBuilder::new(&config.materials.platform).build(Point2::origin(), config.radius));

        for mesh in &meshes {
            let check = mesh.validate();
            debug_assert!(check.is_ok(), "invalid {} mesh: {:?}", mesh.class, check);
            if let Err(err) = check {
                tracing::warn!(class = %mesh.class, error = %err, "Generated mesh failed validation");
            }
        }

        for mesh in &meshes {
            match mesh.class {
                FeatureClass::Building => stats.buildings += 1,
                FeatureClass::Road => stats.roads += 1,
                FeatureClass::Bridge => stats.bridges += 1,
                FeatureClass::WaterArea => stats.water_areas += 1,
                FeatureClass::ParkArea => stats.park_areas += 1,
                FeatureClass::Tree => stats.trees += 1,
                FeatureClass::Platform => {}
            }
        }
        stats.total_meshes = meshes.len();
        stats.total_vertices = meshes.iter().map(MeshBuffer::vertex_count).sum();
        stats.total_triangles = meshes.iter().map(MeshBuffer::triangle_count).sum();
        stats.geometry_time_ms = start.elapsed().as_millis() as u64;
        stats.total_time_ms = stats.geometry_time_ms;

        tracing::info!(
            meshes = stats.total_meshes,
            vertices = stats.total_vertices,
            triangles = stats.total_triangles,
            buildings = stats.buildings,
            roads = stats.roads + stats.bridges,
            trees = stats.trees,
            skipped = stats.skipped_features,
            failed = stats.failed_features,
            geometry_time_ms = stats.geometry_time_ms,
            "Generation pass complete"
        );

        GenerationOutput { meshes, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citymesh_core::{tags_from, GeoPoint, Way};

    /// A ~20 m square of nodes around the origin
    fn square_graph(tags: &[(&str, &str)]) -> OsmGraph {
        let mut graph = OsmGraph::new();
        let d = 0.0001;
        for (id, (lat, lon)) in [(1, (-d, -d)), (2, (-d, d)), (3, (d, d)), (4, (d, -d))] {
            graph.insert_node(GeoPoint::new(id, lat, lon), Tags::default());
        }
        graph.insert_way(Way::new(10, vec![1, 2, 3, 4, 1], tags_from(tags.iter().copied())));
        graph
    }

    fn quiet_config() -> GenerationConfig {
        GenerationConfig {
            tree_count: 0,
            radius: 100.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_graph_yields_platform() {
        let mut session = GenerationSession::new(quiet_config());
        let output = session.generate_graph(OsmGraph::new());
        assert_eq!(output.meshes.len(), 1);
        assert_eq!(output.meshes[0].class, FeatureClass::Platform);
        assert_eq!(output.stats.total_meshes, 1);
    }

    #[test]
    fn test_building_square() {
        let mut session = GenerationSession::new(quiet_config());
        let output = session.generate_graph(square_graph(&[("building", "yes"), ("height", "12")]));
        assert_eq!(output.stats.buildings, 1);

        let building = output
            .meshes
            .iter()
            .find(|m| m.class == FeatureClass::Building)
            .unwrap();
        let (min, max) = building.bounds();
        assert!(min.x < 0.0 && max.x > 0.0);
        assert!(max.z >= 12.0);
    }

    #[test]
    fn test_untagged_way_is_ignored() {
        let mut session = GenerationSession::new(quiet_config());
        let output = session.generate_graph(square_graph(&[("barrier", "fence")]));
        assert_eq!(output.stats.total_meshes, 1);
        assert_eq!(output.stats.skipped_features, 0);
    }

    #[test]
    fn test_trees_avoid_building_footprints() {
        let config = GenerationConfig {
            tree_count: 40,
            radius: 15.0,
            ..Default::default()
        };
        let mut session = GenerationSession::new(config);
        let output = session.generate_graph(square_graph(&[("building", "yes")]));

        let building = output
            .meshes
            .iter()
            .find(|m| m.class == FeatureClass::Building)
            .unwrap();
        let (bmin, bmax) = building.bounds();
        for tree in output.meshes.iter().filter(|m| m.class == FeatureClass::Tree) {
            // First vertex is the trunk base center
            let p = tree.position(0);
            let inside = p.x > bmin.x as f64 + 0.5
                && p.x < bmax.x as f64 - 0.5
                && p.y > bmin.y as f64 + 0.5
                && p.y < bmax.y as f64 - 0.5;
            assert!(!inside, "tree at {:?} inside building", p);
        }
    }

    #[test]
    fn test_parse_failure_is_fatal() {
        let mut session = GenerationSession::new(quiet_config());
        assert!(matches!(
            session.generate("{ definitely not a document"),
            Err(crate::PipelineError::Parse(_))
        ));
    }
}
