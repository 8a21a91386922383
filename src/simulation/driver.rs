//! Simulation driver.
//!
//! Drains the event schedule one event at a time. Arrivals invoke the solver
//! and reserve capacity when it accepts; departures release the capacity of
//! requests that were accepted at arrival. Processing is strictly sequential:
//! the solver call blocks until its status file is available.

use std::path::{Path, PathBuf};

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use log::{debug, error, info, warn};

use crate::config::SimulationConfig;
use crate::schedule::{load_plan, Event, EventKind, EventSchedule, Timestamp};
use crate::solver::{EmbeddingSolver, EmbeddingStatus, SolverRequest};
use crate::topology::{load_topology, VirtualNetwork};
use crate::vnr::{resolve_path, LocationConstraints, VnrFiles};

use super::recorder::{RunRecorder, RunSummary};
use super::state::SimulationState;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Scheduled,
    Running,
    Drained,
}

/// One simulation run over a fixed substrate
pub struct Simulation<S> {
    schedule: EventSchedule,
    state: SimulationState,
    solver: S,
    recorder: RunRecorder,
    phys_topology: PathBuf,
    vnr_directory: PathBuf,
    working_directory: PathBuf,
    check_invariants: bool,
    phase: RunPhase,
    events_processed: u64,
    last_timestamp: Option<Timestamp>,
}

impl<S: EmbeddingSolver> Simulation<S> {
    /// Load the plan and substrate named by `config` and prepare the output layout
    pub fn new(config: &SimulationConfig, solver: S) -> Result<Self> {
        let plan = load_plan(&config.simulation_plan).wrap_err("Invalid simulation plan")?;
        let schedule = EventSchedule::build(&plan, config.max_simulation_time);

        let sn = load_topology(&config.phys_topology).wrap_err("Invalid substrate topology")?;
        info!(
            "Substrate {:?}: {} nodes, {} edges, {} total bandwidth",
            config.phys_topology,
            sn.node_count(),
            sn.edge_count(),
            sn.total_bandwidth()
        );

        let recorder = RunRecorder::new(&config.phys_topology, &config.data_directory)?;
        let working_directory =
            std::env::current_dir().wrap_err("Failed to determine working directory")?;

        Ok(Self {
            schedule,
            state: SimulationState::new(sn),
            solver,
            recorder,
            phys_topology: config.phys_topology.clone(),
            vnr_directory: config.vnr_directory.clone(),
            working_directory,
            check_invariants: config.check_invariants,
            phase: RunPhase::Scheduled,
            events_processed: 0,
            last_timestamp: None,
        })
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn recorder(&self) -> &RunRecorder {
        &self.recorder
    }

    /// Events still waiting in the schedule
    pub fn pending_events(&self) -> usize {
        self.schedule.len()
    }

    /// Drain the schedule and write the run summary
    pub fn run(&mut self) -> Result<RunSummary> {
        info!("Running simulation with {} scheduled events", self.schedule.len());
        while self.step()?.is_some() {}

        let summary = self.summary();
        self.recorder.write_summary(&summary)?;
        info!("total = {}, accepted = {}", summary.total_vns, summary.accepted_vns);
        Ok(summary)
    }

    /// Process the next event, returning it, or `None` once drained
    pub fn step(&mut self) -> Result<Option<Event>> {
        let Some(event) = self.schedule.pop_next() else {
            self.phase = RunPhase::Drained;
            return Ok(None);
        };
        self.phase = RunPhase::Running;
        info!("{}", event);

        let files = VnrFiles::new(&self.vnr_directory, &event.vn_id);
        let vn_path = self.resolve(&files.topology);
        let vn = load_topology(&vn_path)
            .wrap_err_with(|| format!("Invalid topology for VN '{}'", event.vn_id))?;

        match event.kind {
            EventKind::Arrival => self.handle_arrival(&event, &files, &vn)?,
            EventKind::Departure => self.handle_departure(&event, &files, &vn)?,
        }

        self.events_processed += 1;
        self.last_timestamp = Some(event.timestamp);
        if self.schedule.is_empty() {
            self.phase = RunPhase::Drained;
        }
        Ok(Some(event))
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from_state(&self.state, self.events_processed, self.last_timestamp)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        resolve_path(&self.working_directory, path)
    }

    fn handle_arrival(&mut self, event: &Event, files: &VnrFiles, vn: &VirtualNetwork) -> Result<()> {
        self.state.record_arrival();

        let request = SolverRequest::new(files, &self.phys_topology, &self.working_directory);
        match LocationConstraints::load(&request.location_constraint_file) {
            Ok(constraints) => {
                debug!(
                    "{}: location constraints for {} virtual nodes",
                    event.vn_id,
                    constraints.len()
                );
                for node in vn.nodes() {
                    match constraints.candidates(node) {
                        Some(sites) => debug!("{}: virtual node {} has {} candidate sites", event.vn_id, node, sites.len()),
                        None => warn!("{}: virtual node {} has no location constraint", event.vn_id, node),
                    }
                }
            }
            Err(e) => warn!("{}: {}", event.vn_id, e),
        }

        let outcome = match self.solver.invoke(&request) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!("Counting {} as rejected: {}", event.vn_id, e);
                None
            }
        };

        if let Some(outcome) = outcome {
            info!("{} status: {}", event.vn_id, outcome.status);
            if let Some(secs) = outcome.report.solve_time_secs {
                info!("{} solved in {:.3}s", event.vn_id, secs);
            }

            if outcome.is_accepted() {
                let summary = self
                    .state
                    .reserve(
                        &event.vn_id,
                        vn,
                        &outcome.primary_mapping_file,
                        &outcome.shadow_mapping_file,
                    )
                    .wrap_err_with(|| format!("Failed to reserve capacity for VN '{}'", event.vn_id))?;
                debug!("{} reserved {:?}", event.vn_id, summary);
                self.after_change(event.timestamp)?;
            }
        }

        self.recorder
            .append_result(event.timestamp, self.state.total_vns(), self.state.accepted_vns())
    }

    fn handle_departure(&mut self, event: &Event, files: &VnrFiles, vn: &VirtualNetwork) -> Result<()> {
        let status = EmbeddingStatus::read_from(&self.resolve(&files.status));
        info!("{} status: {}", event.vn_id, status);

        let admitted = self.state.is_admitted(&event.vn_id);
        match (status.is_accepted(), admitted) {
            (false, false) => {
                debug!("{} was never accepted, nothing to release", event.vn_id);
                return Ok(());
            }
            (true, false) => {
                warn!(
                    "{} status file reports '{}' but its arrival reserved nothing, skipping release",
                    event.vn_id, status
                );
                return Ok(());
            }
            (false, true) => warn!(
                "{} status file no longer reports acceptance, releasing the reservation made at arrival",
                event.vn_id
            ),
            (true, true) => {}
        }

        let primary = self.resolve(&files.primary_mapping);
        let shadow = self.resolve(&files.shadow_mapping);
        let summary = self
            .state
            .release(&event.vn_id, vn, &primary, &shadow)
            .wrap_err_with(|| format!("Failed to release capacity for VN '{}'", event.vn_id))?;
        debug!("{} released {:?}", event.vn_id, summary);
        self.after_change(event.timestamp)
    }

    /// Audit and persist after a capacity change
    fn after_change(&self, timestamp: Timestamp) -> Result<()> {
        if self.check_invariants {
            self.state
                .check_conservation()
                .map_err(|e| eyre!("Substrate state is inconsistent at ts = {}: {}", timestamp, e))?;
        }
        self.recorder.persist_state(&self.state, timestamp)
    }
}
