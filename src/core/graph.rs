//! Node table with weighted directed adjacency
//!
//! The table is keyed by OSM node id in ascending order, so every iteration
//! over it (BFS seeding, serialization) is deterministic for a given input.

use std::collections::BTreeMap;

use crate::core::record::NodeId;

/// Directed edge owned by its source node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub target: NodeId,
    /// Great-circle length in miles
    pub distance: f64,
    /// Travel speed in mph
    pub speed: f64,
}

impl Edge {
    pub fn new(target: NodeId, distance: f64, speed: f64) -> Self {
        debug_assert!(distance >= 0.0, "edge distance must be non-negative");
        debug_assert!(speed > 0.0, "edge speed must be positive");
        Self {
            target,
            distance,
            speed,
        }
    }

    /// Travel time in hours, always derived from the stored distance and speed
    pub fn time(&self) -> f64 {
        self.distance / self.speed
    }
}

/// Graph node: coordinates plus outgoing edges
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub lat: f64,
    pub lon: f64,
    adjacency: Vec<Edge>,
}

impl Node {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            adjacency: Vec::new(),
        }
    }

    /// Outgoing edges in insertion order
    pub fn adjacency(&self) -> &[Edge] {
        &self.adjacency
    }

    pub fn edge_to(&self, target: NodeId) -> Option<&Edge> {
        self.adjacency.iter().find(|e| e.target == target)
    }
}

/// Outcome of an edge insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsert {
    Inserted,
    /// An edge with the same (source, target) pair already exists
    Duplicate,
}

/// An endpoint of an edge insertion is absent from the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingNode(pub NodeId);

/// All nodes of the graph keyed by id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeTable {
    nodes: BTreeMap<NodeId, Node>,
}

impl NodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Nodes in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Total number of directed edges
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.adjacency.len()).sum()
    }

    /// Insert or replace a node, returning true when an earlier declaration was overwritten
    ///
    /// A replaced node starts again with empty adjacency.
    pub fn insert_node(&mut self, id: NodeId, lat: f64, lon: f64) -> bool {
        self.nodes.insert(id, Node::new(lat, lon)).is_some()
    }

    /// Add a directed edge from `source`, ignoring it if `source → target` already exists
    ///
    /// Both endpoints must already be in the table.
    pub fn insert_edge(&mut self, source: NodeId, edge: Edge) -> Result<EdgeInsert, MissingNode> {
        if !self.nodes.contains_key(&edge.target) {
            return Err(MissingNode(edge.target));
        }
        let node = self.nodes.get_mut(&source).ok_or(MissingNode(source))?;

        if node.edge_to(edge.target).is_some() {
            return Ok(EdgeInsert::Duplicate);
        }
        node.adjacency.push(edge);
        Ok(EdgeInsert::Inserted)
    }
}
