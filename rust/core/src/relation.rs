// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Multipolygon assembly
//!
//! Water areas are often mapped as relations whose outer boundary is split
//! across several ways. The assembler chains those fragments into closed
//! rings and registers each ring as a synthetic closed way, so the rest of
//! the pipeline never has to look at relations.

use crate::graph::OsmGraph;
use crate::model::{ElementId, MemberType, Relation, Tags, Way};
use std::collections::VecDeque;

/// Tag predicate for relations that describe water
pub fn is_water_bearing(tags: &Tags) -> bool {
    let get = |key: &str| tags.get(key).map(String::as_str);

    matches!(get("natural"), Some("water" | "wetland" | "bay" | "strait"))
        || get("waterway").is_some()
        || get("water").is_some()
        || matches!(get("landuse"), Some("reservoir" | "basin"))
        || get("type") == Some("waterway")
}

/// Try to attach `fragment` to either end of `chain`, in either orientation.
/// Returns false (and leaves `chain` unchanged) when no endpoint matches.
fn try_attach(chain: &mut VecDeque<ElementId>, fragment: &[ElementId]) -> bool {
    let (Some(&head), Some(&tail)) = (chain.front(), chain.back()) else {
        return false;
    };
    let (Some(&first), Some(&last)) = (fragment.first(), fragment.last()) else {
        return false;
    };

    if tail == first {
        chain.extend(fragment[1..].iter().copied());
    } else if tail == last {
        chain.extend(fragment[..fragment.len() - 1].iter().rev().copied());
    } else if head == last {
        for &id in fragment[..fragment.len() - 1].iter().rev() {
            chain.push_front(id);
        }
    } else if head == first {
        for &id in fragment[1..].iter() {
            chain.push_front(id);
        }
    } else {
        return false;
    }
    true
}

#[inline]
fn is_closed(chain: &VecDeque<ElementId>) -> bool {
    chain.len() > 2 && chain.front() == chain.back()
}

/// Chain way fragments (node-id sequences) into rings.
///
/// Each returned ring lists its nodes once, without repeating the first
/// node at the end. A fragment that matches nothing becomes a ring of its
/// own (and is discarded if it has fewer than 3 distinct nodes).
pub fn chain_fragments(fragments: Vec<Vec<ElementId>>) -> Vec<Vec<ElementId>> {
    let mut remaining: VecDeque<Vec<ElementId>> =
        fragments.into_iter().filter(|f| f.len() >= 2).collect();
    let mut rings = Vec::new();

    while let Some(start) = remaining.pop_front() {
        let mut chain: VecDeque<ElementId> = start.into_iter().collect();

        while !is_closed(&chain) && !remaining.is_empty() {
            let mut attached_any = false;
            let mut deferred = VecDeque::with_capacity(remaining.len());

            for fragment in remaining.drain(..) {
                if !is_closed(&chain) && try_attach(&mut chain, &fragment) {
                    attached_any = true;
                } else {
                    deferred.push_back(fragment);
                }
            }
            remaining = deferred;

            if !attached_any {
                break;
            }
        }

        let mut ring: Vec<ElementId> = chain.into_iter().collect();
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }

        let mut distinct = ring.clone();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() >= 3 {
            rings.push(ring);
        } else {
            tracing::trace!(nodes = ring.len(), "Discarding degenerate ring");
        }
    }

    rings
}

/// Outer-boundary fragments of a relation that are present in the graph
fn outer_fragments(relation: &Relation, graph: &OsmGraph) -> Vec<Vec<ElementId>> {
    relation
        .members
        .iter()
        .filter(|m| m.member_type == MemberType::Way)
        .filter(|m| m.role.is_empty() || m.role == "outer")
        .filter_map(|m| graph.ways.get(&m.reference))
        .map(|w| {
            w.nodes
                .iter()
                .copied()
                .filter(|id| graph.nodes.contains_key(id))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Assemble all water-bearing relations of `graph` into synthetic closed ways.
///
/// Synthetic ids start just above the largest parsed way id, so they never
/// collide with document ids. Returns the number of ways added.
pub fn assemble_water_relations(graph: &mut OsmGraph) -> usize {
    let mut next_id = graph.max_way_id() + 1;
    let mut synthetic = Vec::new();

    for relation in graph.relations.values() {
        if !is_water_bearing(&relation.tags) {
            continue;
        }

        let fragments = outer_fragments(relation, graph);
        if fragments.is_empty() {
            continue;
        }

        for mut ring in chain_fragments(fragments) {
            if let Some(&first) = ring.first() {
                ring.push(first);
            }
            synthetic.push(Way::new(next_id, ring, relation.tags.clone()));
            next_id += 1;
        }
    }

    let added = synthetic.len();
    for way in synthetic {
        graph.insert_way(way);
    }

    if added > 0 {
        tracing::debug!(rings = added, "Assembled water relations");
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{tags_from, GeoPoint, Member};
    use smallvec::smallvec;

    fn sorted(mut ring: Vec<ElementId>) -> Vec<ElementId> {
        ring.sort_unstable();
        ring
    }

    #[test]
    fn test_chain_two_fragments() {
        let rings = chain_fragments(vec![vec![1, 2, 3], vec![3, 4, 1]]);
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].len(), 4);
        assert_eq!(sorted(rings[0].clone()), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_chain_reversed_fragment() {
        // Second fragment runs the other way round
        let rings = chain_fragments(vec![vec![1, 2, 3], vec![1, 4, 3]]);
        assert_eq!(rings.len(), 1);
        assert_eq!(sorted(rings[0].clone()), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_chain_deferred_fragment() {
        // (3,4) touches nothing on the first pass and only joins after (2,3) does
        let rings = chain_fragments(vec![vec![1, 2], vec![3, 4], vec![4, 1], vec![2, 3]]);
        assert_eq!(rings.len(), 1);
        assert_eq!(sorted(rings[0].clone()), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_unmatched_fragment_stays_separate() {
        let rings = chain_fragments(vec![
            vec![1, 2, 3],
            vec![3, 4, 1],
            vec![10, 11, 12, 10],
        ]);
        assert_eq!(rings.len(), 2);
        assert_eq!(sorted(rings[0].clone()), vec![1, 2, 3, 4]);
        assert_eq!(sorted(rings[1].clone()), vec![10, 11, 12]);
    }

    #[test]
    fn test_short_ring_discarded() {
        let rings = chain_fragments(vec![vec![1, 2], vec![7, 8, 7]]);
        assert!(rings.is_empty());
    }

    #[test]
    fn test_water_predicate() {
        assert!(is_water_bearing(&tags_from([("natural", "water")])));
        assert!(is_water_bearing(&tags_from([("waterway", "riverbank")])));
        assert!(is_water_bearing(&tags_from([("landuse", "reservoir")])));
        assert!(is_water_bearing(&tags_from([("type", "waterway")])));
        assert!(!is_water_bearing(&tags_from([("landuse", "forest")])));
        assert!(!is_water_bearing(&tags_from([("type", "multipolygon")])));
    }

    #[test]
    fn test_assemble_into_graph() {
        let mut graph = OsmGraph::new();
        for (id, lat, lon) in [(1, 0.0, 0.0), (2, 0.0, 0.001), (3, 0.001, 0.001), (4, 0.001, 0.0)] {
            graph.insert_node(GeoPoint::new(id, lat, lon), Tags::default());
        }
        graph.insert_way(Way::new(100, vec![1, 2, 3], Tags::default()));
        graph.insert_way(Way::new(101, vec![3, 4, 1], Tags::default()));
        // Inner members are ignored
        graph.insert_way(Way::new(102, vec![2, 4], Tags::default()));

        let member = |reference, role: &str| Member {
            member_type: MemberType::Way,
            reference,
            role: role.to_string(),
        };
        graph.insert_relation(Relation {
            id: 500,
            members: smallvec![member(100, "outer"), member(101, ""), member(102, "inner")],
            tags: tags_from([("type", "multipolygon"), ("natural", "water")]),
        });

        let added = assemble_water_relations(&mut graph);
        assert_eq!(added, 1);

        let way = &graph.ways[&103];
        assert!(way.is_closed());
        assert_eq!(way.nodes.len(), 5);
        assert_eq!(way.tag("natural"), Some("water"));
    }
}
