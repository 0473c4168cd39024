// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Map element types: points, ways and relations

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Element identifier as used by the source document
pub type ElementId = i64;

/// Attribute tags (keys are unique)
pub type Tags = FxHashMap<String, String>;

/// A geographic point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub id: ElementId,
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(id: ElementId, lat: f64, lon: f64) -> Self {
        Self { id, lat, lon }
    }
}

/// An ordered sequence of point references with tags
#[derive(Debug, Clone, Default)]
pub struct Way {
    pub id: ElementId,
    /// Node references in order. May contain ids that are absent from the graph.
    pub nodes: Vec<ElementId>,
    pub tags: Tags,
}

impl Way {
    pub fn new(id: ElementId, nodes: Vec<ElementId>, tags: Tags) -> Self {
        Self { id, nodes, tags }
    }

    /// Get a tag value
    #[inline]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// A way whose first and last node reference are the same
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.nodes.len() >= 4 && self.nodes.first() == self.nodes.last()
    }
}

/// Kind of element a relation member points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberType {
    Node,
    Way,
    Relation,
}

impl MemberType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "node" => Some(MemberType::Node),
            "way" => Some(MemberType::Way),
            "relation" => Some(MemberType::Relation),
            _ => None,
        }
    }
}

/// Relation member: (type, reference, role)
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub member_type: MemberType,
    pub reference: ElementId,
    pub role: String,
}

/// A tagged grouping of members
#[derive(Debug, Clone, Default)]
pub struct Relation {
    pub id: ElementId,
    pub members: SmallVec<[Member; 4]>,
    pub tags: Tags,
}

impl Relation {
    #[inline]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// Build a tag map from key/value pairs
pub fn tags_from<I, K, V>(pairs: I) -> Tags
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_way_closed() {
        let open = Way::new(1, vec![1, 2, 3], Tags::default());
        assert!(!open.is_closed());

        let closed = Way::new(2, vec![1, 2, 3, 1], Tags::default());
        assert!(closed.is_closed());

        // Two nodes back and forth is not an area
        let degenerate = Way::new(3, vec![1, 2, 1], Tags::default());
        assert!(!degenerate.is_closed());
    }

    #[test]
    fn test_member_type() {
        assert_eq!(MemberType::parse("way"), Some(MemberType::Way));
        assert_eq!(MemberType::parse("area"), None);
    }
}
