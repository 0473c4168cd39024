// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Node/way/relation graph built from a map document

use crate::model::{ElementId, GeoPoint, Relation, Tags, Way};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// The three element collections of a map extract.
///
/// Ways and relations are kept in id order so that every pass over them
/// is deterministic.
#[derive(Debug, Clone, Default)]
pub struct OsmGraph {
    pub nodes: FxHashMap<ElementId, GeoPoint>,
    pub ways: BTreeMap<ElementId, Way>,
    pub relations: BTreeMap<ElementId, Relation>,
    /// Tags of the nodes that carry any
    node_tags: FxHashMap<ElementId, Tags>,
    /// Elements dropped during parsing because of missing attributes
    pub skipped_elements: usize,
}

impl OsmGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_node(&mut self, point: GeoPoint, tags: Tags) {
        if !tags.is_empty() {
            self.node_tags.insert(point.id, tags);
        }
        self.nodes.insert(point.id, point);
    }

    pub fn insert_way(&mut self, way: Way) {
        self.ways.insert(way.id, way);
    }

    pub fn insert_relation(&mut self, relation: Relation) {
        self.relations.insert(relation.id, relation);
    }

    /// Tags of a node, if it has any
    #[inline]
    pub fn node_tags(&self, id: ElementId) -> Option<&Tags> {
        self.node_tags.get(&id)
    }

    /// Iterate over tagged nodes in id order
    pub fn tagged_nodes(&self) -> impl Iterator<Item = (&GeoPoint, &Tags)> {
        let mut ids: Vec<&ElementId> = self.node_tags.keys().collect();
        ids.sort_unstable();
        ids.into_iter()
            .filter_map(move |id| Some((self.nodes.get(id)?, self.node_tags.get(id)?)))
    }

    /// Resolve the points of a way, dropping references to missing nodes
    pub fn way_points(&self, way: &Way) -> Vec<GeoPoint> {
        way.nodes
            .iter()
            .filter_map(|id| self.nodes.get(id).copied())
            .collect()
    }

    /// Largest way id present, or 0 for an empty graph
    pub fn max_way_id(&self) -> ElementId {
        self.ways.keys().next_back().copied().unwrap_or(0).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.ways.is_empty() && self.relations.is_empty()
    }
}
