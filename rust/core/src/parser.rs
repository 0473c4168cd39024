// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Map document parser
//!
//! Reads the element-list JSON shape returned by Overpass-style services:
//!
//! ```json
//! {"elements": [
//!   {"type": "node", "id": 1, "lat": 52.5, "lon": 13.4},
//!   {"type": "way", "id": 10, "nodes": [1, 2, 3, 1], "tags": {"building": "yes"}},
//!   {"type": "relation", "id": 20, "members": [{"type": "way", "ref": 10, "role": "outer"}]}
//! ]}
//! ```
//!
//! A document that is not JSON or has no element list fails as a whole.
//! Individual elements that lack a required attribute are skipped.

use crate::error::{Error, Result};
use crate::graph::OsmGraph;
use crate::model::{ElementId, GeoPoint, Member, MemberType, Relation, Tags, Way};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct RawDocument {
    elements: Vec<Value>,
}

#[derive(Deserialize)]
struct RawElement {
    #[serde(rename = "type")]
    kind: Option<String>,
    id: Option<ElementId>,
    lat: Option<f64>,
    lon: Option<f64>,
    nodes: Option<Vec<ElementId>>,
    members: Option<Vec<RawMember>>,
    #[serde(default)]
    tags: Tags,
}

#[derive(Deserialize)]
struct RawMember {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(rename = "ref")]
    reference: Option<ElementId>,
    #[serde(default)]
    role: String,
}

/// A parsed element, before insertion into the graph
enum Element {
    Node(GeoPoint, Tags),
    Way(Way),
    Relation(Relation),
}

/// Parse a complete document into a graph.
///
/// On `Err` the caller should treat the run as failed and use an empty
/// [`OsmGraph::default()`]; no partial graph is returned.
pub fn parse_document(content: &str) -> Result<OsmGraph> {
    let document: RawDocument = serde_json::from_str(content)
        .map_err(|e| Error::ParseFailure(format!("malformed document: {}", e)))?;

    let mut graph = OsmGraph::default();
    for value in document.elements {
        match parse_element(value) {
            Ok(Some(Element::Node(point, tags))) => graph.insert_node(point, tags),
            Ok(Some(Element::Way(way))) => graph.insert_way(way),
            Ok(Some(Element::Relation(relation))) => graph.insert_relation(relation),
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed element");
                graph.skipped_elements += 1;
            }
        }
    }

    tracing::debug!(
        nodes = graph.nodes.len(),
        ways = graph.ways.len(),
        relations = graph.relations.len(),
        skipped = graph.skipped_elements,
        "Parsed map document"
    );

    Ok(graph)
}

/// Parse one element. Unknown element types yield `Ok(None)`.
fn parse_element(value: Value) -> Result<Option<Element>> {
    let raw: RawElement = serde_json::from_value(value)?;
    let kind = raw.kind.ok_or(Error::MissingAttribute {
        kind: "element",
        field: "type",
    })?;

    match kind.as_str() {
        "node" => {
            let id = raw.id.ok_or(Error::MissingAttribute { kind: "node", field: "id" })?;
            let lat = raw.lat.ok_or(Error::MissingAttribute { kind: "node", field: "lat" })?;
            let lon = raw.lon.ok_or(Error::MissingAttribute { kind: "node", field: "lon" })?;
            Ok(Some(Element::Node(GeoPoint::new(id, lat, lon), raw.tags)))
        }
        "way" => {
            let id = raw.id.ok_or(Error::MissingAttribute { kind: "way", field: "id" })?;
            let nodes = raw
                .nodes
                .ok_or(Error::MissingAttribute { kind: "way", field: "nodes" })?;
            Ok(Some(Element::Way(Way::new(id, nodes, raw.tags))))
        }
        "relation" => {
            let id = raw
                .id
                .ok_or(Error::MissingAttribute { kind: "relation", field: "id" })?;
            let raw_members = raw
                .members
                .ok_or(Error::MissingAttribute { kind: "relation", field: "members" })?;

            // Members with an unknown type or no reference are dropped individually
            let members = raw_members
                .into_iter()
                .filter_map(|m| {
                    let member_type = MemberType::parse(m.kind.as_deref()?)?;
                    Some(Member {
                        member_type,
                        reference: m.reference?,
                        role: m.role,
                    })
                })
                .collect();

            Ok(Some(Element::Relation(Relation {
                id,
                members,
                tags: raw.tags,
            })))
        }
        _ => Ok(None),
    }
}
