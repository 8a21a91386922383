//! Solver gateway.
//!
//! The embedding decision is made by an external process. This module defines
//! the contract the simulator relies on:
//!
//! - the solver receives the substrate, VN and location-constraint paths
//! - before exiting it writes `<vn_id>.status` whose first line is the outcome
//! - on success it also writes `<vn_id>.emap` and `<vn_id>.semap`
//!
//! Only `Optimal` and `Successful` count as acceptance. A missing or
//! unreadable status file reads as an empty status, i.e. rejection.
//!
//! The [`EmbeddingSolver`] trait is the seam between the simulation driver and
//! the process; tests substitute an implementation that writes fixtures.

pub mod binary;
pub mod external;

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::debug;

use crate::vnr::{resolve_path, VnrFiles};

pub use binary::{resolve_executable, validate_executable, BinaryError};
pub use external::{ExternalSolver, SolverReport};

/// Status values that mean the request was embedded
pub const ACCEPTED_STATUSES: [&str; 2] = ["Optimal", "Successful"];

/// Outcome text reported by the solver
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddingStatus(String);

impl EmbeddingStatus {
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    /// Empty status used when nothing could be read
    pub fn rejected() -> Self {
        Self::default()
    }

    /// Read the first line of a status file, trimmed of line terminators.
    ///
    /// Any failure to open or read the file yields an empty status.
    pub fn read_from(path: &Path) -> Self {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                debug!("No status file {:?}: {}", path, e);
                return Self::rejected();
            }
        };

        let mut line = String::new();
        if let Err(e) = BufReader::new(file).read_line(&mut line) {
            debug!("Unreadable status file {:?}: {}", path, e);
            return Self::rejected();
        }
        Self(line.trim_end_matches(['\r', '\n']).to_string())
    }

    pub fn is_accepted(&self) -> bool {
        ACCEPTED_STATUSES.contains(&self.0.as_str())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmbeddingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "<none>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Everything the solver needs for one arrival
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverRequest {
    pub vn_id: String,
    pub pn_topology_file: PathBuf,
    pub vn_topology_file: PathBuf,
    pub location_constraint_file: PathBuf,
    pub status_file: PathBuf,
    pub primary_mapping_file: PathBuf,
    pub shadow_mapping_file: PathBuf,
}

impl SolverRequest {
    /// Build a request with every path resolved against `base`
    pub fn new(files: &VnrFiles, pn_topology_file: &Path, base: &Path) -> Self {
        Self {
            vn_id: files.vn_id.clone(),
            pn_topology_file: resolve_path(base, pn_topology_file),
            vn_topology_file: resolve_path(base, &files.topology),
            location_constraint_file: resolve_path(base, &files.location_constraints),
            status_file: resolve_path(base, &files.status),
            primary_mapping_file: resolve_path(base, &files.primary_mapping),
            shadow_mapping_file: resolve_path(base, &files.shadow_mapping),
        }
    }

    /// Command-line flags passed to the solver
    pub fn args(&self) -> Vec<String> {
        vec![
            format!("--pn_topology_file={}", self.pn_topology_file.display()),
            format!("--vn_topology_file={}", self.vn_topology_file.display()),
            format!("--location_constraint_file={}", self.location_constraint_file.display()),
        ]
    }
}

/// Result of one solver invocation
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingOutcome {
    pub status: EmbeddingStatus,
    pub primary_mapping_file: PathBuf,
    pub shadow_mapping_file: PathBuf,
    pub report: SolverReport,
}

impl EmbeddingOutcome {
    /// Outcome for a request, reading its status file now
    pub fn from_status_file(request: &SolverRequest, report: SolverReport) -> Self {
        Self {
            status: EmbeddingStatus::read_from(&request.status_file),
            primary_mapping_file: request.primary_mapping_file.clone(),
            shadow_mapping_file: request.shadow_mapping_file.clone(),
            report,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.status.is_accepted()
    }
}

/// Errors from running the solver
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Failed to launch solver {executable}: {source}")]
    Launch {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed waiting for solver {executable}: {source}")]
    Wait {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Something that decides whether and how a request is embedded.
///
/// Implementations block until the decision is available.
pub trait EmbeddingSolver {
    fn invoke(&mut self, request: &SolverRequest) -> Result<EmbeddingOutcome, SolverError>;
}

impl<S: EmbeddingSolver + ?Sized> EmbeddingSolver for Box<S> {
    fn invoke(&mut self, request: &SolverRequest) -> Result<EmbeddingOutcome, SolverError> {
        (**self).invoke(request)
    }
}
