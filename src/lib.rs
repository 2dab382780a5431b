//! # Butterfly-graph Library
//!
//! Turns an OpenStreetMap extract into a weighted, directed street graph
//! restricted to its largest connected component.
//!
//! ## Features
//!
//! - **Highway filtering**: only drivable `highway=*` classes become edges
//! - **Speed resolution**: `maxspeed` tags in km/h or mph, class defaults otherwise
//! - **Deterministic output**: node ids, adjacency order and component choice are stable
//! - **Streaming-friendly builder**: records may arrive in any order
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use butterfly_graph::{run_pipeline, OutputTarget, PipelineOptions};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let report = run_pipeline(
//!         Path::new("monaco-latest.osm.pbf"),
//!         &OutputTarget::File("monaco.json".into()),
//!         &PipelineOptions::default(),
//!     )?;
//!     println!("{} nodes kept", report.extraction.nodes);
//!     Ok(())
//! }
//! ```
//!
//! ## In-memory records
//!
//! ```rust
//! use butterfly_graph::{build_graph, extract_largest_component, Connectivity, OsmRecord};
//!
//! let records = vec![
//!     OsmRecord::node(1, 0.0, 0.0),
//!     OsmRecord::node(2, 0.0, 0.01),
//!     OsmRecord::way(10, &[1, 2], &[("highway", "residential")]),
//! ];
//! let built = build_graph(records).unwrap();
//! let largest = extract_largest_component(&built.table, Connectivity::Forward).unwrap();
//! assert_eq!(largest.table.len(), 2);
//! ```

// Re-export core types that users might need
pub use crate::core::builder::{
    build_graph, way_edges, BuildStats, BuiltGraph, EdgeInsertion, GraphBuilder, ResolvedWay,
};
pub use crate::core::components::{
    extract_largest_component, ComponentExtractor, Connectivity, Extraction, ExtractionStats,
};
pub use crate::core::error::{Error, Result};
pub use crate::core::geo::haversine_miles;
pub use crate::core::graph::{Edge, EdgeInsert, MissingNode, Node, NodeTable};
pub use crate::core::output::{
    write_graph, write_graph_to, GraphDocument, OutputOptions, OutputTarget, OverwriteBehavior, WeightFields,
};
pub use crate::core::pipeline::{run_pipeline, PipelineError, PipelineOptions, PipelineReport, Stage, StageCallback};
pub use crate::core::record::{NodeId, NodeRecord, OsmRecord, WayRecord};
pub use crate::core::source::{resolve_output_filename, PbfSource};
pub use crate::core::speed::{
    is_oneway, kmh_to_mph, parse_maxspeed_mph, resolve_speed, HighwayClass, NotRoutable, ResolvedSpeed, SpeedSource,
    KM_PER_MILE,
};

// Internal modules
mod core;
