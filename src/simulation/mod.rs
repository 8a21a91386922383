//! Discrete event simulation of VN arrivals and departures.
//!
//! - `state.rs`: substrate, ledger and acceptance counters for one run
//! - `recorder.rs`: persisted topology, utilization snapshots and results
//! - `driver.rs`: the event loop tying schedule, solver and state together

pub mod driver;
pub mod recorder;
pub mod state;

pub use driver::{RunPhase, Simulation};
pub use recorder::{RunRecorder, RunSummary};
pub use state::{InvariantError, SimulationState};
