//! Per-request file layout.
//!
//! Every virtual network request lives in the VNR directory as a group of
//! files named after its identifier:
//!
//! | file          | content                                  | written by |
//! |---------------|------------------------------------------|------------|
//! | `<id>`        | VN topology (CSV)                        | upstream   |
//! | `<id>loc`     | location constraints                     | upstream   |
//! | `<id>.status` | embedding status, first line             | solver     |
//! | `<id>.emap`   | primary edge mapping                     | solver     |
//! | `<id>.semap`  | shadow edge mapping                      | solver     |

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::mapping::MappingKind;
use crate::topology::NodeId;

/// Paths of all files belonging to one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VnrFiles {
    pub vn_id: String,
    pub topology: PathBuf,
    pub location_constraints: PathBuf,
    pub status: PathBuf,
    pub primary_mapping: PathBuf,
    pub shadow_mapping: PathBuf,
}

impl VnrFiles {
    pub fn new(vnr_directory: &Path, vn_id: &str) -> Self {
        Self {
            vn_id: vn_id.to_string(),
            topology: vnr_directory.join(vn_id),
            location_constraints: vnr_directory.join(format!("{}loc", vn_id)),
            status: vnr_directory.join(format!("{}.status", vn_id)),
            primary_mapping: vnr_directory.join(format!("{}.{}", vn_id, MappingKind::Primary.extension())),
            shadow_mapping: vnr_directory.join(format!("{}.{}", vn_id, MappingKind::Shadow.extension())),
        }
    }

    pub fn mapping(&self, kind: MappingKind) -> &Path {
        match kind {
            MappingKind::Primary => &self.primary_mapping,
            MappingKind::Shadow => &self.shadow_mapping,
        }
    }
}

/// Resolve `path` against `base` unless it is already absolute
pub fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Errors raised while reading a location-constraint file
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Failed to read location constraints {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Location constraint line {line}: invalid node '{value}'")]
    InvalidNode { line: usize, value: String },
}

/// Candidate substrate sites for each virtual node.
///
/// Only the solver consumes this file; the simulator reads it for
/// diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationConstraints {
    candidates: BTreeMap<NodeId, Vec<NodeId>>,
}

impl LocationConstraints {
    /// Parse `vn_node,site,site,...` lines
    pub fn parse(content: &str) -> Result<Self, LocationError> {
        let mut candidates = BTreeMap::new();

        for (index, line) in content.lines().enumerate() {
            let line_no = index + 1;
            if line.trim().is_empty() {
                continue;
            }

            let mut ids = Vec::new();
            for field in line.split(',').map(str::trim).filter(|f| !f.is_empty()) {
                let id = field.parse::<NodeId>().map_err(|_| LocationError::InvalidNode {
                    line: line_no,
                    value: field.to_string(),
                })?;
                ids.push(id);
            }

            if let Some((&vn_node, sites)) = ids.split_first() {
                candidates.insert(vn_node, sites.to_vec());
            }
        }

        Ok(Self { candidates })
    }

    pub fn load(path: &Path) -> Result<Self, LocationError> {
        let content = fs::read_to_string(path).map_err(|source| LocationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn candidates(&self, vn_node: NodeId) -> Option<&[NodeId]> {
        self.candidates.get(&vn_node).map(Vec::as_slice)
    }

    /// Number of constrained virtual nodes
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vnr_file_names() {
        let files = VnrFiles::new(Path::new("vnr"), "vn3");
        assert_eq!(files.topology, PathBuf::from("vnr/vn3"));
        assert_eq!(files.location_constraints, PathBuf::from("vnr/vn3loc"));
        assert_eq!(files.status, PathBuf::from("vnr/vn3.status"));
        assert_eq!(files.mapping(MappingKind::Primary), Path::new("vnr/vn3.emap"));
        assert_eq!(files.mapping(MappingKind::Shadow), Path::new("vnr/vn3.semap"));
    }

    #[test]
    fn test_resolve_path() {
        let base = Path::new("/work");
        assert_eq!(resolve_path(base, Path::new("sn.txt")), PathBuf::from("/work/sn.txt"));
        assert_eq!(resolve_path(base, Path::new("/data/sn.txt")), PathBuf::from("/data/sn.txt"));
    }

    #[test]
    fn test_parse_location_constraints() {
        let constraints = LocationConstraints::parse("0,4,5,6\n1,7\n2\n").unwrap();
        assert_eq!(constraints.len(), 3);
        assert_eq!(constraints.candidates(0), Some(&[4, 5, 6][..]));
        assert_eq!(constraints.candidates(2).map(|sites| sites.len()), Some(0));
        assert_eq!(constraints.candidates(9), None);

        assert!(matches!(
            LocationConstraints::parse("0,x"),
            Err(LocationError::InvalidNode { line: 1, .. })
        ));
    }
}
