//! CSV load/store for topology files.
//!
//! Each line describes one undirected edge with seven comma-separated fields:
//!
//! ```text
//! flag,u,v,flag2,cost,bandwidth,flag3
//! ```
//!
//! Only `u`, `v`, `cost` (index 4) and `bandwidth` (index 5) carry meaning.
//! The flags are placeholders kept so the files stay readable by the external
//! solver; saving writes them back as `0`, `0` and `1`.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use super::graph::Graph;
use super::types::NodeId;

/// Number of fields on every topology line
pub const FIELD_COUNT: usize = 7;

const FIELD_U: usize = 1;
const FIELD_V: usize = 2;
const FIELD_COST: usize = 4;
const FIELD_BANDWIDTH: usize = 5;

/// Errors that can occur while reading or writing a topology file
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("Failed to access topology file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line}: expected 7 fields, found {found}")]
    FieldCount { line: usize, found: usize },

    #[error("Line {line}: invalid {field} value '{value}'")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("Line {line}: negative bandwidth {bandwidth} on edge ({u}, {v})")]
    NegativeBandwidth {
        line: usize,
        u: NodeId,
        v: NodeId,
        bandwidth: i64,
    },
}

fn parse_field<T: std::str::FromStr>(
    fields: &[&str],
    index: usize,
    field: &'static str,
    line: usize,
) -> Result<T, TopologyError> {
    fields[index]
        .parse::<T>()
        .map_err(|_| TopologyError::InvalidField {
            line,
            field,
            value: fields[index].to_string(),
        })
}

/// Parse topology text into a graph.
///
/// Blank lines are skipped. Line numbers in errors are 1-based.
pub fn parse_topology(content: &str) -> Result<Graph, TopologyError> {
    let mut graph = Graph::new();

    for (index, raw_line) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != FIELD_COUNT {
            return Err(TopologyError::FieldCount {
                line: line_no,
                found: fields.len(),
            });
        }

        let u: NodeId = parse_field(&fields, FIELD_U, "node_u", line_no)?;
        let v: NodeId = parse_field(&fields, FIELD_V, "node_v", line_no)?;
        let cost: i64 = parse_field(&fields, FIELD_COST, "cost", line_no)?;
        let bandwidth: i64 = parse_field(&fields, FIELD_BANDWIDTH, "bandwidth", line_no)?;

        if bandwidth < 0 {
            return Err(TopologyError::NegativeBandwidth {
                line: line_no,
                u,
                v,
                bandwidth,
            });
        }

        if graph.add_edge(u, v, bandwidth, cost).is_some() {
            warn!("Line {}: duplicate edge ({}, {}) replaces an earlier definition", line_no, u, v);
        }
    }

    Ok(graph)
}

/// Load a topology file
pub fn load_topology(path: &Path) -> Result<Graph, TopologyError> {
    let content = fs::read_to_string(path).map_err(|source| TopologyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let graph = parse_topology(&content)?;
    debug!(
        "Loaded topology {:?}: {} nodes, {} edges",
        path,
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

/// Render a graph in the seven-field topology format.
///
/// The bandwidth column holds the current value of each edge, so a saved
/// substrate always reflects residual capacity.
pub fn format_topology(graph: &Graph) -> String {
    let mut out = String::new();
    for (key, attrs) in graph.edges() {
        let _ = writeln!(
            out,
            "0,{},{},0,{},{},1",
            key.u(),
            key.v(),
            attrs.cost,
            attrs.bandwidth
        );
    }
    out
}

/// Overwrite `path` with the current state of `graph`
pub fn save_topology(graph: &Graph, path: &Path) -> Result<(), TopologyError> {
    fs::write(path, format_topology(graph)).map_err(|source| TopologyError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_topology_fields() {
        let content = "0,0,1,0,3,100,1\n0,2,1,0,1,45,1\n";
        let graph = parse_topology(content).unwrap();

        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.bandwidth(0, 1), Some(100));
        assert_eq!(graph.bandwidth(1, 2), Some(45));

        let attrs = graph.edge(crate::topology::EdgeKey::new(1, 2)).unwrap();
        assert_eq!(attrs.cost, 1);
    }

    #[test]
    fn test_parse_topology_ignores_placeholders_and_blank_lines() {
        let content = "9,0,1,7,2,10,5\r\n\n   \n";
        let graph = parse_topology(content).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.bandwidth(1, 0), Some(10));
    }

    #[test]
    fn test_parse_topology_rejects_malformed_lines() {
        assert!(matches!(
            parse_topology("0,0,1,0,3,100"),
            Err(TopologyError::FieldCount { line: 1, found: 6 })
        ));
        assert!(matches!(
            parse_topology("0,0,1,0,3,100,1\n0,a,1,0,3,100,1"),
            Err(TopologyError::InvalidField { line: 2, field: "node_u", .. })
        ));
        assert!(matches!(
            parse_topology("0,0,1,0,3,-5,1"),
            Err(TopologyError::NegativeBandwidth { bandwidth: -5, .. })
        ));
    }

    #[test]
    fn test_save_writes_current_bandwidth() {
        let mut graph = parse_topology("0,1,0,0,4,100,1\n").unwrap();
        graph.edge_mut(crate::topology::EdgeKey::new(0, 1)).unwrap().bandwidth = 20;

        assert_eq!(format_topology(&graph), "0,0,1,0,4,20,1\n");
    }

    #[test]
    fn test_load_save_roundtrip_through_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "0,0,1,0,1,100,1\n0,1,2,0,2,60,1\n").unwrap();

        let graph = load_topology(temp_file.path()).unwrap();
        save_topology(&graph, temp_file.path()).unwrap();
        let reloaded = load_topology(temp_file.path()).unwrap();

        assert_eq!(graph, reloaded);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_topology(Path::new("/nonexistent/sn.txt"));
        assert!(matches!(result, Err(TopologyError::Io { .. })));
    }
}
