//! Shared fixtures for the simulation tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use vnesim::config::SimulationConfig;
use vnesim::solver::{EmbeddingOutcome, EmbeddingSolver, SolverError, SolverReport, SolverRequest};

/// What the fake solver does for one request
#[derive(Debug, Clone)]
pub enum Decision {
    /// Write the status file and both mapping files
    Embed {
        status: String,
        emap: String,
        semap: String,
    },
    /// Write only a status file
    Status(String),
    /// Exit without writing anything
    Silent,
    /// Fail to start at all
    LaunchFailure,
}

impl Decision {
    pub fn optimal(emap: &str, semap: &str) -> Self {
        Self::Embed {
            status: "Optimal".to_string(),
            emap: emap.to_string(),
            semap: semap.to_string(),
        }
    }
}

/// Solver stand-in writing deterministic fixtures instead of spawning a process
#[derive(Debug, Default)]
pub struct FakeSolver {
    decisions: HashMap<String, Decision>,
    pub invocations: Vec<String>,
}

impl FakeSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decide(mut self, vn_id: &str, decision: Decision) -> Self {
        self.decisions.insert(vn_id.to_string(), decision);
        self
    }
}

impl EmbeddingSolver for FakeSolver {
    fn invoke(&mut self, request: &SolverRequest) -> Result<EmbeddingOutcome, SolverError> {
        self.invocations.push(request.vn_id.clone());

        match self.decisions.get(&request.vn_id).cloned().unwrap_or(Decision::Silent) {
            Decision::Embed { status, emap, semap } => {
                fs::write(&request.status_file, format!("{}\n", status)).unwrap();
                fs::write(&request.primary_mapping_file, emap).unwrap();
                fs::write(&request.shadow_mapping_file, semap).unwrap();
            }
            Decision::Status(status) => {
                fs::write(&request.status_file, format!("{}\n", status)).unwrap();
            }
            Decision::Silent => {}
            Decision::LaunchFailure => {
                return Err(SolverError::Launch {
                    executable: PathBuf::from("fake-solver"),
                    source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
                });
            }
        }

        Ok(EmbeddingOutcome::from_status_file(request, SolverReport::default()))
    }
}

/// Scratch directory laid out like a simulation working directory
pub struct Workspace {
    pub dir: TempDir,
    pub config: SimulationConfig,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("vnr")).unwrap();

        let config = SimulationConfig {
            executable: Some("fake-solver".to_string()),
            phys_topology: root.join("sn.txt"),
            vnr_directory: root.join("vnr"),
            simulation_plan: root.join("vnr-simulation"),
            max_simulation_time: 1000,
            data_directory: root.join("sim-data"),
            ..SimulationConfig::default()
        };

        Self { dir, config }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_substrate(&self, content: &str) {
        fs::write(&self.config.phys_topology, content).unwrap();
    }

    pub fn substrate_file(&self) -> String {
        fs::read_to_string(&self.config.phys_topology).unwrap()
    }

    pub fn write_plan(&self, content: &str) {
        fs::write(&self.config.simulation_plan, content).unwrap();
    }

    /// Write a VN topology and a trivial location-constraint file
    pub fn write_vn(&self, vn_id: &str, content: &str) {
        let vnr = &self.config.vnr_directory;
        fs::write(vnr.join(vn_id), content).unwrap();
        fs::write(vnr.join(format!("{}loc", vn_id)), "0,0,1\n1,0,1\n").unwrap();
    }

    pub fn results_log(&self) -> String {
        fs::read_to_string(self.config.data_directory.join("sim-results")).unwrap_or_default()
    }

    pub fn snapshot(&self, timestamp: i64) -> Option<String> {
        fs::read_to_string(
            self.config
                .data_directory
                .join("util-data")
                .join(format!("util.{}", timestamp)),
        )
        .ok()
    }
}

/// Single edge (0, 1), bandwidth 100, cost 1
pub const SINGLE_EDGE_SN: &str = "0,0,1,0,1,100,1\n";

/// One virtual edge (0, 1) with the given demand
pub fn single_edge_vn(demand: i64) -> String {
    format!("0,0,1,0,1,{},1\n", demand)
}

pub const EMAP_01: &str = "Virtual edge (0, 1) --> physical edge (0, 1)\n";
pub const SEMAP_01: &str = "Shadow virtual edge of (0, 1) --> physical edge (0, 1)\n";
