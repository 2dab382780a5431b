//! Record source over an OSM PBF extract
//!
//! Decodes nodes and highway-tagged ways into [`OsmRecord`]s. Ways without a
//! `highway` tag (buildings, land use, boundaries...) never reach the builder.

use std::path::{Path, PathBuf};

use log::info;
use osmpbf::{BlobReader, BlobType, Element, ElementReader};

use crate::core::error::{Error, Result};
use crate::core::record::{NodeRecord, OsmRecord, WayRecord};

/// An OSM PBF file on disk
pub struct PbfSource {
    path: PathBuf,
}

impl PbfSource {
    /// Open a PBF source, failing early if the file is missing
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Input file not found: {}", path.display()),
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Decode the whole file, handing each record to `sink` as it is read
    ///
    /// Nodes and highway ways arrive in file order. Nothing is retained here,
    /// so the only copy of the data is whatever `sink` keeps.
    pub fn for_each_record<F>(&self, mut sink: F) -> Result<()>
    where
        F: FnMut(OsmRecord),
    {
        self.check_header()?;

        let reader = ElementReader::from_path(&self.path)?;
        let mut nodes = 0u64;
        let mut ways = 0u64;

        reader.for_each(|element| match element {
            Element::Node(node) => {
                nodes += 1;
                sink(OsmRecord::Node(NodeRecord {
                    id: node.id(),
                    lat: node.lat(),
                    lon: node.lon(),
                }));
            }
            Element::DenseNode(node) => {
                nodes += 1;
                sink(OsmRecord::Node(NodeRecord {
                    id: node.id(),
                    lat: node.lat(),
                    lon: node.lon(),
                }));
            }
            Element::Way(way) => {
                if way.tags().any(|(k, _)| k == "highway") {
                    ways += 1;
                    sink(OsmRecord::Way(WayRecord {
                        id: way.id(),
                        nodes: way.refs().collect(),
                        tags: way
                            .tags()
                            .map(|(k, v)| (k.to_string(), v.to_string()))
                            .collect(),
                    }));
                }
            }
            Element::Relation(_) => {}
        })?;

        info!(
            "Read {nodes} nodes and {ways} highway ways from {}",
            self.path.display()
        );
        Ok(())
    }

    /// An extract must start with an `OSMHeader` blob; empty files are rejected
    fn check_header(&self) -> Result<()> {
        let mut blobs = BlobReader::from_path(&self.path)?;
        let reason = match blobs.next() {
            None => "file contains no blobs".to_string(),
            Some(blob) => match blob?.get_type() {
                BlobType::OsmHeader => return Ok(()),
                BlobType::OsmData => "first blob is OSMData, expected OSMHeader".to_string(),
                BlobType::Unknown(kind) => format!("first blob has unknown type {kind:?}"),
            },
        };
        Err(Error::InvalidPbf {
            path: self.path.display().to_string(),
            reason,
        })
    }
}

/// Generates the default output filename for an input extract
///
/// `monaco-latest.osm.pbf` → `monaco-latest.json`, in the input's directory.
pub fn resolve_output_filename(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let stem = [".osm.pbf", ".pbf", ".osm"]
        .iter()
        .find_map(|ext| name.strip_suffix(ext))
        .filter(|stem| !stem.is_empty())
        .unwrap_or(name.as_str());

    let stem = if stem.is_empty() { "graph" } else { stem };
    input.with_file_name(format!("{stem}.json"))
}
