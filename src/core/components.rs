//! Largest connected component extraction
//!
//! Nodes are used as BFS seeds in ascending id order. A single visited set is
//! shared by all runs, so every node belongs to exactly one component and the
//! whole partition costs O(V + E). The largest component wins; on a tie the
//! earlier-seeded one is kept.
//!
//! With [`Connectivity::Forward`] the traversal follows outgoing edges only,
//! so a component is the set of not-yet-visited nodes reachable from its seed.
//! Nodes that can only reach the seed, but are not reachable from it, end up
//! in components of their own. [`Connectivity::Undirected`] traverses the
//! symmetric closure instead and yields weakly connected components.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::error::{Error, Result};
use crate::core::graph::{EdgeInsert, NodeTable};
use crate::core::record::NodeId;

/// Which adjacency relation defines "connected"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// Follow outgoing edges only
    #[default]
    Forward,
    /// Follow edges in both directions
    Undirected,
}

/// Counters describing an extraction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub components: u64,
    pub largest_seed: Option<NodeId>,
    pub nodes: u64,
    pub edges: u64,
    /// Edges of surviving nodes that pointed outside the component
    pub boundary_edges_dropped: u64,
}

/// The largest component as a standalone graph
#[derive(Debug, Clone)]
pub struct Extraction {
    pub table: NodeTable,
    pub stats: ExtractionStats,
}

/// Partitions a node table into components by breadth-first search
pub struct ComponentExtractor<'a> {
    table: &'a NodeTable,
    connectivity: Connectivity,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> ComponentExtractor<'a> {
    pub fn new(table: &'a NodeTable) -> Self {
        Self {
            table,
            connectivity: Connectivity::default(),
            cancel: None,
        }
    }

    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Stop with [`Error::Cancelled`] once `flag` is set; checked between dequeues
    pub fn with_cancel_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// All components in seed order, members in BFS order
    pub fn components(&self) -> Result<Vec<Vec<NodeId>>> {
        let mut all = Vec::new();
        self.partition(|members| all.push(members))?;
        Ok(all)
    }

    /// Members of the largest component (empty for an empty table)
    pub fn largest(&self) -> Result<Vec<NodeId>> {
        let mut best: Vec<NodeId> = Vec::new();
        self.partition(|members| {
            if members.len() > best.len() {
                best = members;
            }
        })?;
        Ok(best)
    }

    /// Extract the largest component together with its induced edges
    pub fn extract(&self) -> Result<Extraction> {
        let mut best: Vec<NodeId> = Vec::new();
        let components = self.partition(|members| {
            if members.len() > best.len() {
                best = members;
            }
        })?;

        let (table, dropped) = self.induced_subgraph(&best);
        let stats = ExtractionStats {
            components,
            largest_seed: best.first().copied(),
            nodes: table.len() as u64,
            edges: table.edge_count() as u64,
            boundary_edges_dropped: dropped,
        };

        info!(
            "Largest of {} components has {} nodes and {} edges ({} boundary edges dropped)",
            stats.components, stats.nodes, stats.edges, stats.boundary_edges_dropped
        );

        Ok(Extraction { table, stats })
    }

    /// Run one BFS per unvisited seed, handing each component to `visit`
    fn partition<F>(&self, mut visit: F) -> Result<u64>
    where
        F: FnMut(Vec<NodeId>),
    {
        let reverse = match self.connectivity {
            Connectivity::Forward => None,
            Connectivity::Undirected => Some(self.reverse_adjacency()),
        };

        let mut visited: FxHashSet<NodeId> =
            FxHashSet::with_capacity_and_hasher(self.table.len(), Default::default());
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        let mut count = 0u64;

        for seed in self.table.ids() {
            if !visited.insert(seed) {
                continue;
            }
            queue.push_back(seed);
            let mut members = Vec::new();

            while let Some(current) = queue.pop_front() {
                self.check_cancelled()?;
                members.push(current);

                let node = self
                    .table
                    .get(current)
                    .expect("edge target missing from node table");
                for edge in node.adjacency() {
                    if visited.insert(edge.target) {
                        queue.push_back(edge.target);
                    }
                }
                if let Some(sources) = reverse.as_ref().and_then(|r| r.get(&current)) {
                    for &source in sources {
                        if visited.insert(source) {
                            queue.push_back(source);
                        }
                    }
                }
            }

            count += 1;
            debug!("Component {count} seeded at {seed}: {} nodes", members.len());
            visit(members);
        }

        Ok(count)
    }

    fn check_cancelled(&self) -> Result<()> {
        match self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }

    /// Incoming neighbours per node
    fn reverse_adjacency(&self) -> FxHashMap<NodeId, Vec<NodeId>> {
        let mut reverse: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
        for (id, node) in self.table.iter() {
            for edge in node.adjacency() {
                reverse.entry(edge.target).or_default().push(id);
            }
        }
        reverse
    }

    /// Copy `members` and the edges between them into a new table
    fn induced_subgraph(&self, members: &[NodeId]) -> (NodeTable, u64) {
        let keep: FxHashSet<NodeId> = members.iter().copied().collect();
        let mut induced = NodeTable::new();
        let mut dropped = 0u64;

        for &id in members {
            if let Some(node) = self.table.get(id) {
                induced.insert_node(id, node.lat, node.lon);
            }
        }

        for (id, node) in self.table.iter().filter(|(id, _)| keep.contains(id)) {
            for edge in node.adjacency() {
                if keep.contains(&edge.target) {
                    let inserted = induced.insert_edge(id, *edge);
                    debug_assert_eq!(inserted, Ok(EdgeInsert::Inserted));
                } else {
                    dropped += 1;
                }
            }
        }

        (induced, dropped)
    }
}

/// Extract the largest component of `table`
pub fn extract_largest_component(table: &NodeTable, connectivity: Connectivity) -> Result<Extraction> {
    ComponentExtractor::new(table)
        .with_connectivity(connectivity)
        .extract()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::Edge;

    /// Build a table from nodes and directed (source, target) pairs
    fn graph(ids: &[NodeId], edges: &[(NodeId, NodeId)]) -> NodeTable {
        let mut table = NodeTable::new();
        for &id in ids {
            table.insert_node(id, 0.0, id as f64 * 0.001);
        }
        for &(a, b) in edges {
            table.insert_edge(a, Edge::new(b, 1.0, 25.0)).unwrap();
        }
        table
    }

    fn sorted(mut v: Vec<NodeId>) -> Vec<NodeId> {
        v.sort_unstable();
        v
    }

    #[test]
    fn test_empty_table() {
        let table = NodeTable::new();
        let extraction = extract_largest_component(&table, Connectivity::Forward).unwrap();
        assert!(extraction.table.is_empty());
        assert_eq!(extraction.stats.components, 0);
        assert_eq!(extraction.stats.largest_seed, None);
    }

    #[test]
    fn test_single_isolated_node() {
        let table = graph(&[9], &[]);
        let extraction = extract_largest_component(&table, Connectivity::Forward).unwrap();
        assert_eq!(extraction.table.len(), 1);
        assert_eq!(extraction.table.edge_count(), 0);
        assert_eq!(extraction.stats.components, 1);
    }

    #[test]
    fn test_largest_component_wins() {
        let table = graph(
            &[1, 2, 3, 4, 5, 6],
            &[(1, 2), (2, 1), (3, 4), (4, 3), (4, 5), (5, 4)],
        );
        let extractor = ComponentExtractor::new(&table);

        assert_eq!(sorted(extractor.largest().unwrap()), vec![3, 4, 5]);
        let components = extractor.components().unwrap();
        assert_eq!(components.len(), 3);
        assert_eq!(components[2], vec![6]);
    }

    #[test]
    fn test_tie_keeps_first_seed() {
        let table = graph(&[1, 2, 3, 4], &[(3, 4), (4, 3), (1, 2), (2, 1)]);
        let extraction = extract_largest_component(&table, Connectivity::Forward).unwrap();
        assert_eq!(extraction.stats.largest_seed, Some(1));
        assert_eq!(extraction.table.ids().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_forward_traversal_ignores_incoming_edges() {
        // 1 → 3 and 2 → 3; from seed 1 only {1, 3} is reachable.
        let table = graph(&[1, 2, 3], &[(1, 3), (2, 3)]);

        let forward = ComponentExtractor::new(&table).components().unwrap();
        assert_eq!(forward, vec![vec![1, 3], vec![2]]);

        let undirected = ComponentExtractor::new(&table)
            .with_connectivity(Connectivity::Undirected)
            .components()
            .unwrap();
        assert_eq!(undirected.len(), 1);
        assert_eq!(sorted(undirected[0].clone()), vec![1, 2, 3]);
    }

    #[test]
    fn test_bfs_order_and_single_visit() {
        // Diamond plus tail: every node reached exactly once
        let table = graph(&[1, 2, 3, 4, 5], &[(1, 2), (1, 3), (2, 4), (3, 4), (4, 5)]);
        let components = ComponentExtractor::new(&table).components().unwrap();
        assert_eq!(components, vec![vec![1, 2, 3, 4, 5]]);
    }

    #[test]
    fn test_output_keeps_only_induced_edges() {
        // Seed 1 reaches {1, 2, 3}; 4 points into the component but is not part of it.
        let table = graph(&[1, 2, 3, 4], &[(1, 2), (2, 3), (3, 1), (4, 1), (2, 1)]);
        let extraction = extract_largest_component(&table, Connectivity::Forward).unwrap();

        assert_eq!(extraction.table.ids().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(extraction.table.edge_count(), 4);
        for (id, node) in extraction.table.iter() {
            let original = table.get(id).unwrap();
            assert_eq!(node.lat, original.lat);
            assert_eq!(node.lon, original.lon);
            for edge in node.adjacency() {
                assert!(extraction.table.contains(edge.target));
                assert_eq!(original.edge_to(edge.target), Some(edge));
            }
        }
    }

    #[test]
    fn test_edges_into_earlier_component_are_dropped() {
        // Seed 0 claims {0, 3}; seed 1 then reaches {1, 2, 4} and 2 → 0 crosses the boundary.
        let table = graph(
            &[0, 1, 2, 3, 4],
            &[(0, 3), (1, 2), (2, 1), (2, 4), (4, 2), (2, 0)],
        );
        let extraction = extract_largest_component(&table, Connectivity::Forward).unwrap();

        assert_eq!(extraction.stats.components, 2);
        assert_eq!(extraction.stats.largest_seed, Some(1));
        assert_eq!(extraction.table.ids().collect::<Vec<_>>(), vec![1, 2, 4]);
        assert_eq!(extraction.table.edge_count(), 4);
        assert_eq!(extraction.stats.boundary_edges_dropped, 1);
        assert!(extraction.table.get(2).unwrap().edge_to(0).is_none());
    }

    #[test]
    fn test_cancel_flag_stops_traversal() {
        let table = graph(&[1, 2], &[(1, 2), (2, 1)]);
        let flag = AtomicBool::new(true);
        let result = ComponentExtractor::new(&table)
            .with_cancel_flag(&flag)
            .extract();
        assert!(matches!(result, Err(Error::Cancelled)));

        flag.store(false, Ordering::Relaxed);
        let extraction = ComponentExtractor::new(&table)
            .with_cancel_flag(&flag)
            .extract()
            .unwrap();
        assert_eq!(extraction.table.len(), 2);
    }
}
