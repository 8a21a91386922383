//! Parser for the solver's edge mapping files.
//!
//! The solver writes two files per accepted request, one line per mapped
//! substrate edge:
//!
//! ```text
//! Virtual edge (m, n) --> physical edge (u, v)                  <vn_id>.emap
//! Shadow virtual edge of (m, n) --> physical edge (u, v)        <vn_id>.semap
//! ```
//!
//! Lines are read with a small fixed-prefix tokenizer. Both endpoint pairs are
//! canonicalized and the reserved bandwidth is always taken from the demand
//! declared in the virtual network, never from the mapping text.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::topology::{EdgeKey, NodeId, VirtualNetwork};

/// Which of the two mapping files a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingKind {
    /// Working path of a virtual edge
    Primary,
    /// Protection path reserved alongside the primary
    Shadow,
}

impl MappingKind {
    /// Literal text that starts every line of this kind
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Primary => "Virtual edge ",
            Self::Shadow => "Shadow virtual edge of ",
        }
    }

    /// File extension used by the solver for this kind
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Primary => "emap",
            Self::Shadow => "semap",
        }
    }
}

/// Separator between the virtual and the physical pair
const ARROW: &str = " --> physical edge ";

/// One virtual edge to physical edge assignment, canonicalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingLine {
    pub virtual_edge: EdgeKey,
    pub physical_edge: EdgeKey,
}

/// A mapping line resolved against the virtual network's demand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingRecord {
    pub kind: MappingKind,
    pub virtual_edge: EdgeKey,
    pub physical_edge: EdgeKey,
    pub reserved_bandwidth: i64,
}

/// Reasons a single line fails to tokenize
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    #[error("expected '{expected}' at column {column}")]
    Expected { expected: String, column: usize },

    #[error("expected a node index at column {column}")]
    MissingNumber { column: usize },

    #[error("node index '{value}' at column {column} is out of range")]
    NumberOutOfRange { value: String, column: usize },

    #[error("unexpected trailing text '{rest}'")]
    TrailingInput { rest: String },
}

/// Errors raised while reading a mapping file
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("Failed to read mapping file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed {kind:?} mapping on line {line}: {source} in '{text}'")]
    Malformed {
        kind: MappingKind,
        line: usize,
        text: String,
        #[source]
        source: LineError,
    },

    #[error("Line {line}: virtual edge {edge} does not exist in the virtual network")]
    UnknownVirtualEdge { line: usize, edge: EdgeKey },
}

/// Cursor over a single mapping line
struct Tokenizer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    fn expect(&mut self, literal: &str) -> Result<(), LineError> {
        if self.rest().starts_with(literal) {
            self.position += literal.len();
            Ok(())
        } else {
            Err(LineError::Expected {
                expected: literal.to_string(),
                column: self.position + 1,
            })
        }
    }

    fn number(&mut self) -> Result<NodeId, LineError> {
        let rest = self.rest();
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Err(LineError::MissingNumber {
                column: self.position + 1,
            });
        }
        let text = &rest[..digits];
        let value = text.parse::<NodeId>().map_err(|_| LineError::NumberOutOfRange {
            value: text.to_string(),
            column: self.position + 1,
        })?;
        self.position += digits;
        Ok(value)
    }

    /// Read `(a, b)` and return the canonical edge
    fn pair(&mut self) -> Result<EdgeKey, LineError> {
        self.expect("(")?;
        let a = self.number()?;
        self.expect(", ")?;
        let b = self.number()?;
        self.expect(")")?;
        Ok(EdgeKey::new(a, b))
    }

    fn finish(&self) -> Result<(), LineError> {
        let rest = self.rest();
        if rest.trim().is_empty() {
            Ok(())
        } else {
            Err(LineError::TrailingInput {
                rest: rest.to_string(),
            })
        }
    }
}

/// Tokenize one mapping line of the given kind.
///
/// # Examples
/// ```
/// use vnesim::mapping::{parse_line, MappingKind};
/// use vnesim::topology::EdgeKey;
///
/// let line = parse_line("Virtual edge (2, 0) --> physical edge (7, 3)", MappingKind::Primary).unwrap();
/// assert_eq!(line.virtual_edge, EdgeKey::new(0, 2));
/// assert_eq!(line.physical_edge, EdgeKey::new(3, 7));
/// ```
pub fn parse_line(line: &str, kind: MappingKind) -> Result<MappingLine, LineError> {
    let mut tokens = Tokenizer::new(line.trim_end_matches(['\r', '\n']));
    tokens.expect(kind.prefix())?;
    let virtual_edge = tokens.pair()?;
    tokens.expect(ARROW)?;
    let physical_edge = tokens.pair()?;
    tokens.finish()?;

    Ok(MappingLine {
        virtual_edge,
        physical_edge,
    })
}

/// Parse the content of a mapping file into records.
///
/// Blank lines are skipped; any other line that does not match the expected
/// shape fails the whole file. Zero-demand virtual edges still produce a
/// record with `reserved_bandwidth == 0`.
pub fn parse_mapping(
    content: &str,
    kind: MappingKind,
    vn: &VirtualNetwork,
) -> Result<Vec<MappingRecord>, MappingError> {
    let mut records = Vec::new();

    for (index, text) in content.lines().enumerate() {
        let line_no = index + 1;
        if text.trim().is_empty() {
            continue;
        }

        let parsed = parse_line(text, kind).map_err(|source| MappingError::Malformed {
            kind,
            line: line_no,
            text: text.to_string(),
            source,
        })?;

        let demand = vn
            .edge(parsed.virtual_edge)
            .map(|attrs| attrs.bandwidth)
            .ok_or(MappingError::UnknownVirtualEdge {
                line: line_no,
                edge: parsed.virtual_edge,
            })?;

        records.push(MappingRecord {
            kind,
            virtual_edge: parsed.virtual_edge,
            physical_edge: parsed.physical_edge,
            reserved_bandwidth: demand,
        });
    }

    Ok(records)
}

/// Read and parse a mapping file
pub fn load_mapping_file(
    path: &Path,
    kind: MappingKind,
    vn: &VirtualNetwork,
) -> Result<Vec<MappingRecord>, MappingError> {
    let content = fs::read_to_string(path).map_err(|source| MappingError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = parse_mapping(&content, kind, vn)?;
    debug!("Parsed {} {:?} mapping records from {:?}", records.len(), kind, path);
    Ok(records)
}
