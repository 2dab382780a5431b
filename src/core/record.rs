//! Input record shapes consumed by the graph builder
//!
//! A source yields an ordered stream of [`OsmRecord`]s. The builder does not
//! care where they came from; the PBF reader in [`crate::core::source`] is one
//! producer, tests build them by hand.

/// OSM node identifier
pub type NodeId = i64;

/// A node declaration: id plus WGS84 coordinates in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeRecord {
    pub id: NodeId,
    pub lat: f64,
    pub lon: f64,
}

/// A way declaration: ordered node references plus its raw tags
#[derive(Debug, Clone, PartialEq)]
pub struct WayRecord {
    pub id: i64,
    pub nodes: Vec<NodeId>,
    pub tags: Vec<(String, String)>,
}

impl WayRecord {
    /// Look up a tag value by key
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn highway(&self) -> Option<&str> {
        self.tag("highway")
    }

    pub fn oneway(&self) -> Option<&str> {
        self.tag("oneway")
    }

    pub fn maxspeed(&self) -> Option<&str> {
        self.tag("maxspeed")
    }
}

/// One element of the input stream
#[derive(Debug, Clone, PartialEq)]
pub enum OsmRecord {
    Node(NodeRecord),
    Way(WayRecord),
}

impl OsmRecord {
    pub fn node(id: NodeId, lat: f64, lon: f64) -> Self {
        OsmRecord::Node(NodeRecord { id, lat, lon })
    }

    /// Build a way record from string-slice tags
    pub fn way(id: i64, nodes: &[NodeId], tags: &[(&str, &str)]) -> Self {
        OsmRecord::Way(WayRecord {
            id,
            nodes: nodes.to_vec(),
            tags: tags
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }
}
