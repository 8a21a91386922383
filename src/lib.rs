//! # VNESim - Discrete event simulator for online virtual network embedding
//!
//! This library drives an online virtual network embedding (VNE) workload:
//! virtual network requests arrive and depart over simulated time against a
//! fixed substrate network, and an external solver decides for each arrival
//! whether and how the request is mapped.
//!
//! ## Overview
//!
//! VNESim does not embed anything itself. It keeps the substrate consistent
//! across a schedule of accept/reject decisions reported by the solver:
//!
//! - **Protection-aware bookkeeping**: every accepted request reserves its
//!   demand twice, once along the primary path and once along the shadow path
//! - **Exact release**: the reservation made at arrival is reversed at departure
//! - **Conservation audit**: `reserved + residual == original` is checked on
//!   every substrate edge after each change
//! - **Restartable state**: the substrate file always reflects current residual
//!   capacity
//!
//! ## Architecture
//!
//! - `topology`: undirected graph model and its CSV format
//! - `ledger`: per-edge cumulative reservations and derived utilization
//! - `mapping`: parser for the solver's `.emap` / `.semap` files
//! - `reconcile`: applies mapping records to the substrate and the ledger
//! - `schedule`: simulation plan parsing and the time-ordered event queue
//! - `solver`: the external solver contract and process gateway
//! - `vnr`: per-request file layout and location constraints
//! - `simulation`: run state, persisted outputs and the event loop
//! - `config`, `config_loader`: YAML configuration and CLI overrides
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use vnesim::config_loader::{resolve_config, CliOverrides};
//! use vnesim::simulation::Simulation;
//! use vnesim::solver::ExternalSolver;
//!
//! let overrides = CliOverrides {
//!     executable: Some("./vne_protection".to_string()),
//!     ..CliOverrides::default()
//! };
//! let config = resolve_config(None, &overrides)?;
//!
//! let solver = ExternalSolver::resolve("./vne_protection")?;
//! let summary = Simulation::new(&config, solver)?.run()?;
//! println!("accepted {} of {}", summary.accepted_vns, summary.total_vns);
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Input Files
//!
//! ```text
//! sn.txt           0,u,v,0,cost,bandwidth,1 per substrate edge
//! vnr-simulation   arrival_ts,departure_ts,vn_id per request
//! vnr/<id>         VN topology, same format as sn.txt
//! vnr/<id>loc      vn_node,site,site,... (consumed by the solver)
//! ```
//!
//! ## Error Handling
//!
//! Library modules report failures through `thiserror` enums; the simulation
//! driver wraps them with context using `color_eyre`. A malformed plan,
//! topology or mapping file aborts the run before the substrate file is
//! rewritten. A missing status file or a solver that fails to launch only
//! rejects the affected request.

pub mod config;
pub mod config_loader;
pub mod ledger;
pub mod mapping;
pub mod reconcile;
pub mod schedule;
pub mod simulation;
pub mod solver;
pub mod topology;
pub mod vnr;
