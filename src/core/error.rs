//! Error types for butterfly-graph
//!
//! Only conditions that abort the whole run are errors. Per-record problems
//! (unknown highway class, unusable `maxspeed` tag, duplicate node id) are
//! absorbed by the builder and counted in its statistics instead.

use thiserror::Error;

use crate::core::record::NodeId;

/// Main error type for butterfly-graph operations
#[derive(Error, Debug)]
pub enum Error {
    /// A way references a node that was never declared in the node stream
    #[error("way {way_id} references node {node_id}, which is not present in the node table")]
    DanglingNodeRef { way_id: i64, node_id: NodeId },

    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The PBF stream could not be decoded
    #[error("PBF decoding error: {0}")]
    PbfError(#[from] osmpbf::Error),

    /// The file decodes but is not an OSM extract
    #[error("Invalid PBF file {path}: {reason}")]
    InvalidPbf { path: String, reason: String },

    /// Output serialization failed
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A caller-provided cancellation flag was raised
    #[error("Operation cancelled")]
    Cancelled,
}

/// Convenience result type for butterfly-graph operations
pub type Result<T> = std::result::Result<T, Error>;
