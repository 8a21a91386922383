//! Persisted run state.
//!
//! - the substrate topology file is overwritten after every state change
//! - `<data>/util-data/util.<ts>` holds the utilization snapshot for `ts`
//! - `<data>/sim-results` gets one `ts,total,accepted` line per arrival
//! - `<data>/summary.json` is written once the schedule is drained

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::schedule::Timestamp;
use crate::topology::save_topology;

use super::state::SimulationState;

/// Totals reported at the end of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_vns: u64,
    pub accepted_vns: u64,
    pub rejected_vns: u64,
    pub acceptance_ratio: f64,
    pub events_processed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_time: Option<Timestamp>,
    /// Bandwidth still reserved when the run ended
    pub reserved_bandwidth: i64,
}

impl RunSummary {
    pub fn from_state(state: &SimulationState, events_processed: u64, final_time: Option<Timestamp>) -> Self {
        let total = state.total_vns();
        let accepted = state.accepted_vns();
        Self {
            total_vns: total,
            accepted_vns: accepted,
            rejected_vns: state.rejected_vns(),
            acceptance_ratio: if total == 0 { 0.0 } else { accepted as f64 / total as f64 },
            events_processed,
            final_time,
            reserved_bandwidth: state.ledger().total_reserved(),
        }
    }
}

/// Writes the run's output files
#[derive(Debug, Clone)]
pub struct RunRecorder {
    phys_topology: PathBuf,
    util_directory: PathBuf,
    results_log: PathBuf,
    summary_file: PathBuf,
}

impl RunRecorder {
    /// Prepare the output layout under `data_directory`
    pub fn new(phys_topology: &Path, data_directory: &Path) -> Result<Self> {
        let util_directory = data_directory.join("util-data");
        fs::create_dir_all(&util_directory).wrap_err_with(|| {
            format!("Failed to create output directory '{}'", util_directory.display())
        })?;

        Ok(Self {
            phys_topology: phys_topology.to_path_buf(),
            util_directory,
            results_log: data_directory.join("sim-results"),
            summary_file: data_directory.join("summary.json"),
        })
    }

    pub fn snapshot_path(&self, timestamp: Timestamp) -> PathBuf {
        self.util_directory.join(format!("util.{}", timestamp))
    }

    pub fn results_log(&self) -> &Path {
        &self.results_log
    }

    pub fn summary_file(&self) -> &Path {
        &self.summary_file
    }

    /// Save the substrate and the utilization snapshot for `timestamp`
    pub fn persist_state(&self, state: &SimulationState, timestamp: Timestamp) -> Result<()> {
        save_topology(state.sn(), &self.phys_topology)
            .wrap_err("Failed to persist substrate topology")?;

        let snapshot = self.snapshot_path(timestamp);
        state
            .ledger()
            .write_snapshot(state.sn(), &snapshot)
            .wrap_err_with(|| format!("Failed to write utilization snapshot '{}'", snapshot.display()))?;

        debug!("Persisted state at ts = {}", timestamp);
        Ok(())
    }

    /// Append `timestamp,total,accepted` to the results log
    pub fn append_result(&self, timestamp: Timestamp, total_vns: u64, accepted_vns: u64) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.results_log)
            .wrap_err_with(|| format!("Failed to open results log '{}'", self.results_log.display()))?;
        writeln!(file, "{},{},{}", timestamp, total_vns, accepted_vns)
            .wrap_err("Failed to append to results log")?;
        Ok(())
    }

    pub fn write_summary(&self, summary: &RunSummary) -> Result<()> {
        let json = serde_json::to_string_pretty(summary)?;
        fs::write(&self.summary_file, json)
            .wrap_err_with(|| format!("Failed to write summary '{}'", self.summary_file.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Graph;

    #[test]
    fn test_layout_and_results_log() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("sim-data");
        let recorder = RunRecorder::new(&dir.path().join("sn.txt"), &data).unwrap();

        assert!(data.join("util-data").is_dir());
        assert_eq!(recorder.snapshot_path(42), data.join("util-data").join("util.42"));

        recorder.append_result(0, 1, 1).unwrap();
        recorder.append_result(5, 2, 1).unwrap();
        let log = fs::read_to_string(recorder.results_log()).unwrap();
        assert_eq!(log, "0,1,1\n5,2,1\n");
    }

    #[test]
    fn test_persist_state_writes_topology_and_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let sn_path = dir.path().join("sn.txt");
        let recorder = RunRecorder::new(&sn_path, &dir.path().join("sim-data")).unwrap();

        let mut sn = Graph::new();
        sn.add_edge(0, 1, 100, 1);
        let state = SimulationState::new(sn);

        recorder.persist_state(&state, 7).unwrap();
        assert_eq!(fs::read_to_string(&sn_path).unwrap(), "0,0,1,0,1,100,1\n");
        // Nothing reserved, so the snapshot is empty
        assert_eq!(fs::read_to_string(recorder.snapshot_path(7)).unwrap(), "");
    }

    #[test]
    fn test_summary_json() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = RunRecorder::new(&dir.path().join("sn.txt"), dir.path()).unwrap();

        let mut sn = Graph::new();
        sn.add_edge(0, 1, 100, 1);
        let mut state = SimulationState::new(sn);
        state.record_arrival();

        let summary = RunSummary::from_state(&state, 1, Some(3));
        assert_eq!(summary.rejected_vns, 1);
        assert_eq!(summary.acceptance_ratio, 0.0);

        recorder.write_summary(&summary).unwrap();
        let parsed: RunSummary =
            serde_json::from_str(&fs::read_to_string(recorder.summary_file()).unwrap()).unwrap();
        assert_eq!(parsed, summary);
    }
}
