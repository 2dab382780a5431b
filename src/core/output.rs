//! JSON output of the extracted graph
//!
//! Output schema, one object keyed by node id (ascending):
//!
//! ```json
//! { "123": { "lat": 43.7, "lon": 7.4,
//!            "adj": [ { "nodeId": "124", "distance": 0.02, "maxSpeed": 25.0, "time": 0.0008 } ] } }
//! ```
//!
//! `distance` (miles) is always written. `maxSpeed` (mph) and `time` (hours)
//! are written according to [`WeightFields`].

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::core::error::{Error, Result};
use crate::core::graph::{Edge, NodeTable};

/// Optional weighting fields written next to `distance`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightFields {
    Speed,
    Time,
    #[default]
    Both,
}

impl WeightFields {
    fn speed(self) -> bool {
        matches!(self, WeightFields::Speed | WeightFields::Both)
    }

    fn time(self) -> bool {
        matches!(self, WeightFields::Time | WeightFields::Both)
    }
}

/// Overwrite behavior for an existing output file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteBehavior {
    /// Overwrite with a warning (default)
    #[default]
    Force,
    /// Never overwrite, fail if the file exists
    NeverOverwrite,
}

/// Where the JSON document goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    File(PathBuf),
    Stdout,
}

impl OutputTarget {
    /// `-` means stdout, anything else is a file path
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(PathBuf::from(arg))
        }
    }
}

/// Serialization settings
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub fields: WeightFields,
    pub pretty: bool,
    pub overwrite: OverwriteBehavior,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AdjEntry {
    node_id: String,
    distance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<f64>,
}

impl AdjEntry {
    fn new(edge: &Edge, fields: WeightFields) -> Self {
        Self {
            node_id: edge.target.to_string(),
            distance: edge.distance,
            max_speed: fields.speed().then_some(edge.speed),
            time: fields.time().then(|| edge.time()),
        }
    }
}

#[derive(Serialize)]
struct NodeEntry {
    lat: f64,
    lon: f64,
    adj: Vec<AdjEntry>,
}

/// Serializable view of a node table
pub struct GraphDocument<'a> {
    table: &'a NodeTable,
    fields: WeightFields,
}

impl<'a> GraphDocument<'a> {
    pub fn new(table: &'a NodeTable, fields: WeightFields) -> Self {
        Self { table, fields }
    }
}

impl Serialize for GraphDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.table.len()))?;
        for (id, node) in self.table.iter() {
            let entry = NodeEntry {
                lat: node.lat,
                lon: node.lon,
                adj: node
                    .adjacency()
                    .iter()
                    .map(|edge| AdjEntry::new(edge, self.fields))
                    .collect(),
            };
            map.serialize_entry(&id.to_string(), &entry)?;
        }
        map.end()
    }
}

/// Write the graph as JSON to any writer
pub fn write_graph<W: Write>(writer: W, table: &NodeTable, options: &OutputOptions) -> Result<()> {
    let document = GraphDocument::new(table, options.fields);
    if options.pretty {
        serde_json::to_writer_pretty(writer, &document)?;
    } else {
        serde_json::to_writer(writer, &document)?;
    }
    Ok(())
}

/// Write the graph to a file or stdout
pub fn write_graph_to(target: &OutputTarget, table: &NodeTable, options: &OutputOptions) -> Result<()> {
    match target {
        OutputTarget::File(path) => {
            check_overwrite_permission(path, options.overwrite)?;

            // Serialize next to the destination, then rename over it
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            let temp = NamedTempFile::new_in(dir)?;
            let mut writer = BufWriter::new(temp);
            write_graph(&mut writer, table, options)?;
            let temp = writer.into_inner().map_err(|e| e.into_error())?;
            temp.as_file().sync_all()?;
            temp.persist(path).map_err(|e| e.error)?;
            info!("Wrote {} nodes to {}", table.len(), path.display());
        }
        OutputTarget::Stdout => {
            let stdout = std::io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            write_graph(&mut writer, table, options)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
    }
    Ok(())
}

/// Check if destination file exists and handle overwrite behavior
pub(crate) fn check_overwrite_permission(path: &Path, behavior: OverwriteBehavior) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    match behavior {
        OverwriteBehavior::Force => {
            warn!("Overwriting existing file: {}", path.display());
            Ok(())
        }
        OverwriteBehavior::NeverOverwrite => Err(Error::IoError(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!(
                "File already exists: {} (use --force to overwrite)",
                path.display()
            ),
        ))),
    }
}
