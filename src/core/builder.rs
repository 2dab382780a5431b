//! Graph construction from node and way records
//!
//! Nodes go straight into the [`NodeTable`]. Ways that pass the highway
//! whitelist are buffered and only expanded into edges once the input is
//! exhausted, so coordinates are always read from a complete node table even
//! when the stream interleaves nodes and ways.

use log::{debug, info, warn};

use crate::core::error::{Error, Result};
use crate::core::geo::haversine_miles;
use crate::core::graph::{Edge, EdgeInsert, MissingNode, NodeTable};
use crate::core::record::{NodeId, NodeRecord, OsmRecord, WayRecord};
use crate::core::speed::{is_oneway, resolve_speed, HighwayClass, ResolvedSpeed, SpeedSource};

/// Counters collected while building the graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub nodes_read: u64,
    /// Node ids declared more than once (last declaration kept)
    pub duplicate_nodes: u64,
    pub ways_read: u64,
    /// Ways whose highway class is missing or not drivable
    pub ways_excluded: u64,
    pub ways_kept: u64,
    pub speeds_tagged: u64,
    pub speeds_class_default: u64,
    /// Ways whose `maxspeed` could not be used and fell back to the class default
    pub speeds_defaulted: u64,
    pub edges_inserted: u64,
    pub duplicate_edges: u64,
}

impl BuildStats {
    /// Recoverable per-record issues absorbed during the build
    pub fn recoverable_issues(&self) -> u64 {
        self.ways_excluded + self.speeds_defaulted
    }
}

/// A routable way with its per-way attributes resolved
#[derive(Debug, Clone)]
pub struct ResolvedWay {
    pub id: i64,
    pub nodes: Vec<NodeId>,
    pub class: HighwayClass,
    pub oneway: bool,
    pub speed: ResolvedSpeed,
}

impl ResolvedWay {
    /// Resolve class, direction and speed; `None` if the way is not drivable
    pub fn from_record(way: WayRecord) -> Option<Self> {
        let class = way.highway()?.parse::<HighwayClass>().ok()?;
        let oneway = is_oneway(way.oneway());
        let speed = resolve_speed(class, way.maxspeed());

        Some(Self {
            id: way.id,
            nodes: way.nodes,
            class,
            oneway,
            speed,
        })
    }
}

/// One pending edge: `source → edge.target`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeInsertion {
    pub source: NodeId,
    pub edge: Edge,
}

/// Expand a way into the directed edges it contributes
///
/// Every consecutive pair of node references yields a forward edge, plus a
/// reverse edge with identical distance and speed unless the way is one-way.
/// Fails on the first node reference missing from `table`.
pub fn way_edges(table: &NodeTable, way: &ResolvedWay) -> Result<Vec<EdgeInsertion>> {
    if let Some(&node_id) = way.nodes.iter().find(|&&id| !table.contains(id)) {
        return Err(Error::DanglingNodeRef {
            way_id: way.id,
            node_id,
        });
    }

    let mut insertions = Vec::with_capacity(way.nodes.len().saturating_sub(1) * 2);

    for pair in way.nodes.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let node_a = table.get(a).ok_or(Error::DanglingNodeRef {
            way_id: way.id,
            node_id: a,
        })?;
        let node_b = table.get(b).ok_or(Error::DanglingNodeRef {
            way_id: way.id,
            node_id: b,
        })?;

        let distance = haversine_miles(node_a.lat, node_a.lon, node_b.lat, node_b.lon);

        insertions.push(EdgeInsertion {
            source: a,
            edge: Edge::new(b, distance, way.speed.mph),
        });
        if !way.oneway {
            insertions.push(EdgeInsertion {
                source: b,
                edge: Edge::new(a, distance, way.speed.mph),
            });
        }
    }

    Ok(insertions)
}

/// Result of a completed build
#[derive(Debug, Clone)]
pub struct BuiltGraph {
    pub table: NodeTable,
    pub stats: BuildStats,
}

/// Incremental graph builder fed one record at a time
#[derive(Debug, Default)]
pub struct GraphBuilder {
    table: NodeTable,
    pending: Vec<ResolvedWay>,
    stats: BuildStats,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: OsmRecord) {
        match record {
            OsmRecord::Node(node) => self.add_node(node),
            OsmRecord::Way(way) => self.add_way(way),
        }
    }

    pub fn add_node(&mut self, node: NodeRecord) {
        self.stats.nodes_read += 1;
        if self.table.insert_node(node.id, node.lat, node.lon) {
            self.stats.duplicate_nodes += 1;
            debug!("Node {} declared more than once, keeping the last declaration", node.id);
        }
    }

    pub fn add_way(&mut self, way: WayRecord) {
        self.stats.ways_read += 1;
        let way_id = way.id;
        let highway = way.highway().map(str::to_string);

        let Some(resolved) = ResolvedWay::from_record(way) else {
            self.stats.ways_excluded += 1;
            debug!("Excluding way {way_id}: highway={highway:?} is not a drivable class");
            return;
        };

        self.stats.ways_kept += 1;
        match resolved.speed.source {
            SpeedSource::Tagged => self.stats.speeds_tagged += 1,
            SpeedSource::ClassDefault => self.stats.speeds_class_default += 1,
            SpeedSource::Fallback => {
                self.stats.speeds_defaulted += 1;
                debug!(
                    "Way {way_id}: unusable maxspeed, using {} default of {} mph",
                    resolved.class, resolved.speed.mph
                );
            }
        }
        self.pending.push(resolved);
    }

    /// Expand all buffered ways into edges and return the finished graph
    pub fn finish(self) -> Result<BuiltGraph> {
        let GraphBuilder {
            mut table,
            pending,
            mut stats,
        } = self;

        for way in &pending {
            for insertion in way_edges(&table, way)? {
                match table.insert_edge(insertion.source, insertion.edge) {
                    Ok(EdgeInsert::Inserted) => stats.edges_inserted += 1,
                    Ok(EdgeInsert::Duplicate) => stats.duplicate_edges += 1,
                    // way_edges already checked both endpoints
                    Err(MissingNode(node_id)) => {
                        return Err(Error::DanglingNodeRef {
                            way_id: way.id,
                            node_id,
                        })
                    }
                }
            }
        }

        info!(
            "Built graph: {} nodes, {} directed edges from {} of {} ways",
            table.len(),
            stats.edges_inserted,
            stats.ways_kept,
            stats.ways_read
        );
        if stats.recoverable_issues() > 0 {
            warn!(
                "Absorbed {} recoverable issues: {} ways excluded, {} speed tags replaced by class defaults",
                stats.recoverable_issues(),
                stats.ways_excluded,
                stats.speeds_defaulted
            );
        }

        Ok(BuiltGraph { table, stats })
    }
}

/// Build a graph from a complete record stream
pub fn build_graph<I>(records: I) -> Result<BuiltGraph>
where
    I: IntoIterator<Item = OsmRecord>,
{
    let mut builder = GraphBuilder::new();
    for record in records {
        builder.push(record);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Vec<OsmRecord> {
        vec![
            OsmRecord::node(1, 0.0, 0.0),
            OsmRecord::node(2, 0.0, 1.0),
            OsmRecord::node(3, 1.0, 1.0),
            OsmRecord::way(10, &[1, 2, 3], &[("highway", "residential")]),
            OsmRecord::way(
                11,
                &[3, 1],
                &[("highway", "motorway"), ("oneway", "yes"), ("maxspeed", "100 km/h")],
            ),
        ]
    }

    #[test]
    fn test_bidirectional_way_is_symmetric() {
        let built = build_graph(triangle()).unwrap();
        let table = &built.table;

        for (a, b) in [(1, 2), (2, 3)] {
            let fwd = table.get(a).unwrap().edge_to(b).unwrap();
            let rev = table.get(b).unwrap().edge_to(a).unwrap();
            assert_eq!(fwd.distance, rev.distance);
            assert_eq!(fwd.speed, rev.speed);
            assert_eq!(fwd.speed, 25.0);
        }
    }

    #[test]
    fn test_oneway_way_has_no_reverse() {
        let built = build_graph(triangle()).unwrap();
        let table = &built.table;

        let c_to_a = table.get(3).unwrap().edge_to(1).unwrap();
        assert!((c_to_a.speed - 62.137).abs() < 0.01);
        assert!(table.get(1).unwrap().edge_to(3).is_none());
        assert_eq!(table.edge_count(), 5);
        assert_eq!(built.stats.edges_inserted, 5);
        assert_eq!(built.stats.speeds_tagged, 1);
        assert_eq!(built.stats.speeds_class_default, 1);
    }

    #[test]
    fn test_distance_is_haversine_of_endpoints() {
        let built = build_graph(triangle()).unwrap();
        let ab = built.table.get(1).unwrap().edge_to(2).unwrap();
        assert_eq!(ab.distance, haversine_miles(0.0, 0.0, 0.0, 1.0));
        assert_eq!(ab.time(), ab.distance / 25.0);
    }

    #[test]
    fn test_overlapping_ways_do_not_duplicate_edges() {
        let records = vec![
            OsmRecord::node(1, 0.0, 0.0),
            OsmRecord::node(2, 0.0, 0.01),
            OsmRecord::way(1, &[1, 2], &[("highway", "primary")]),
            OsmRecord::way(2, &[1, 2], &[("highway", "service")]),
            OsmRecord::way(3, &[2, 1], &[("highway", "trunk"), ("oneway", "yes")]),
        ];
        let built = build_graph(records).unwrap();

        assert_eq!(built.table.edge_count(), 2);
        assert_eq!(built.stats.edges_inserted, 2);
        assert_eq!(built.stats.duplicate_edges, 3);
        // The first way to reach a pair fixes its weights
        assert_eq!(built.table.get(1).unwrap().edge_to(2).unwrap().speed, 60.0);
        assert_eq!(built.table.get(2).unwrap().edge_to(1).unwrap().speed, 60.0);
    }

    #[test]
    fn test_non_whitelisted_ways_are_skipped() {
        let records = vec![
            OsmRecord::node(1, 0.0, 0.0),
            OsmRecord::node(2, 0.0, 0.01),
            OsmRecord::way(1, &[1, 2], &[("highway", "footway")]),
            OsmRecord::way(2, &[1, 2], &[("building", "yes")]),
            // Unknown classes never look up their nodes
            OsmRecord::way(3, &[1, 999], &[("highway", "cycleway")]),
        ];
        let built = build_graph(records).unwrap();

        assert_eq!(built.table.edge_count(), 0);
        assert_eq!(built.stats.ways_excluded, 3);
        assert_eq!(built.stats.ways_kept, 0);
        assert_eq!(built.stats.recoverable_issues(), 3);
    }

    #[test]
    fn test_unparseable_speed_falls_back_to_class_default() {
        let records = vec![
            OsmRecord::node(1, 0.0, 0.0),
            OsmRecord::node(2, 0.0, 0.01),
            OsmRecord::way(1, &[1, 2], &[("highway", "tertiary"), ("maxspeed", "signals")]),
        ];
        let built = build_graph(records).unwrap();

        assert_eq!(built.table.get(1).unwrap().edge_to(2).unwrap().speed, 35.0);
        assert_eq!(built.stats.speeds_defaulted, 1);
    }

    #[test]
    fn test_dangling_reference_is_fatal() {
        let records = vec![
            OsmRecord::node(1, 0.0, 0.0),
            OsmRecord::node(2, 0.0, 0.01),
            OsmRecord::way(7, &[1, 2], &[("highway", "residential")]),
            OsmRecord::way(8, &[2, 404], &[("highway", "residential")]),
        ];

        match build_graph(records) {
            Err(Error::DanglingNodeRef { way_id, node_id }) => {
                assert_eq!(way_id, 8);
                assert_eq!(node_id, 404);
            }
            other => panic!("expected DanglingNodeRef, got {other:?}"),
        }
    }

    #[test]
    fn test_single_ref_way_is_still_checked() {
        let records = vec![
            OsmRecord::node(1, 0.0, 0.0),
            OsmRecord::way(9, &[404], &[("highway", "service")]),
        ];
        assert!(matches!(
            build_graph(records),
            Err(Error::DanglingNodeRef { way_id: 9, node_id: 404 })
        ));
    }

    #[test]
    fn test_ways_before_nodes_are_resolved() {
        let records = vec![
            OsmRecord::way(1, &[1, 2], &[("highway", "residential")]),
            OsmRecord::node(1, 0.0, 0.0),
            OsmRecord::node(2, 0.0, 0.01),
        ];
        let built = build_graph(records).unwrap();
        assert_eq!(built.table.edge_count(), 2);
    }

    #[test]
    fn test_duplicate_node_last_write_wins() {
        let records = vec![
            OsmRecord::node(1, 0.0, 0.0),
            OsmRecord::node(2, 0.0, 0.01),
            OsmRecord::node(2, 0.0, 0.02),
            OsmRecord::way(1, &[1, 2], &[("highway", "residential")]),
        ];
        let built = build_graph(records).unwrap();

        assert_eq!(built.stats.duplicate_nodes, 1);
        assert_eq!(built.table.get(2).unwrap().lon, 0.02);
        let d = built.table.get(1).unwrap().edge_to(2).unwrap().distance;
        assert_eq!(d, haversine_miles(0.0, 0.0, 0.0, 0.02));
    }

    #[test]
    fn test_build_is_deterministic() {
        let first = build_graph(triangle()).unwrap();
        let second = build_graph(triangle()).unwrap();
        assert_eq!(first.table, second.table);
        assert_eq!(first.stats, second.stats);
    }

    #[test]
    fn test_way_edges_is_pure() {
        let mut table = NodeTable::new();
        table.insert_node(1, 0.0, 0.0);
        table.insert_node(2, 0.0, 0.01);
        let way = ResolvedWay::from_record(WayRecord {
            id: 5,
            nodes: vec![1, 2],
            tags: vec![("highway".to_string(), "primary".to_string())],
        })
        .unwrap();

        let insertions = way_edges(&table, &way).unwrap();
        assert_eq!(insertions.len(), 2);
        assert_eq!(insertions[0].source, 1);
        assert_eq!(insertions[1].source, 2);
        assert_eq!(table.edge_count(), 0);
    }
}
