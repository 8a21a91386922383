use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::{Path, PathBuf};

use vnesim::config_loader::{resolve_config, CliOverrides};
use vnesim::schedule::Timestamp;
use vnesim::simulation::Simulation;
use vnesim::solver::ExternalSolver;

/// Discrete event simulator for online virtual network embedding
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional YAML configuration; command-line values take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Solver executable invoked for every arrival
    #[arg(short, long)]
    executable: Option<String>,

    /// Substrate topology file, overwritten with residual capacity as the run progresses
    #[arg(long = "phys_topology", visible_alias = "phys-topology")]
    phys_topology: Option<PathBuf>,

    /// Directory holding VN topologies, location constraints and solver output
    #[arg(long = "vnr_directory", visible_alias = "vnr-directory")]
    vnr_directory: Option<PathBuf>,

    /// Simulation plan with one `arrival,departure,vn_id` line per request
    #[arg(long = "simulation_plan", visible_alias = "simulation-plan")]
    simulation_plan: Option<PathBuf>,

    /// Departures after this time are never scheduled
    #[arg(long = "max_simulation_time", visible_alias = "max-simulation-time")]
    max_simulation_time: Option<Timestamp>,

    /// Output directory for utilization snapshots and results
    #[arg(long = "data_directory", visible_alias = "data-directory")]
    data_directory: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long = "log_level", visible_alias = "log-level")]
    log_level: Option<String>,
}

/// Where the effective configuration came from, for the startup log
fn describe_config_source(config: Option<&Path>) -> String {
    match config {
        Some(path) => format!("{} with command-line overrides", path.display()),
        None => "defaults with command-line overrides".to_string(),
    }
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            executable: self.executable.clone(),
            phys_topology: self.phys_topology.clone(),
            vnr_directory: self.vnr_directory.clone(),
            simulation_plan: self.simulation_plan.clone(),
            max_simulation_time: self.max_simulation_time,
            data_directory: self.data_directory.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();
    let config = resolve_config(args.config.as_deref(), &args.overrides())?;

    // Initialize logging with the configured default filter level
    env_logger::Builder::from_env(Env::default().default_filter_or(config.log_level.as_str())).init();

    info!("Starting VNESim");
    info!("Configuration: {}", describe_config_source(args.config.as_deref()));
    info!("Substrate topology: {:?}", config.phys_topology);
    info!("Simulation plan: {:?}", config.simulation_plan);
    info!("Max simulation time: {}", config.max_simulation_time);

    let executable = config
        .executable()
        .ok_or_else(|| eyre!("No solver executable configured"))?;
    let solver = ExternalSolver::resolve(executable)?;
    info!("Solver: {:?}", solver.executable());

    let mut simulation = Simulation::new(&config, solver)?;
    let summary = simulation.run()?;

    info!(
        "Simulation finished: {} events, acceptance ratio {:.3}",
        summary.events_processed, summary.acceptance_ratio
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(["vnesim", "--executable", "./vne_protection"]);

        assert_eq!(args.executable.as_deref(), Some("./vne_protection"));
        assert_eq!(args.config, None);
        assert_eq!(args.max_simulation_time, None);
    }

    #[test]
    fn test_cli_overrides() {
        let args = Args::parse_from([
            "vnesim",
            "--config", "run.yaml",
            "--phys_topology", "topo/sn.txt",
            "--max-simulation-time", "500",
        ]);

        let overrides = args.overrides();
        assert_eq!(args.config, Some(PathBuf::from("run.yaml")));
        assert_eq!(overrides.phys_topology, Some(PathBuf::from("topo/sn.txt")));
        assert_eq!(overrides.max_simulation_time, Some(500));
        assert_eq!(overrides.executable, None);
    }

    #[test]
    fn test_cli_accepts_underscore_and_dash_flags() {
        let underscore = Args::parse_from([
            "vnesim",
            "--vnr_directory", "vnr",
            "--simulation_plan", "plan",
            "--data_directory", "out",
        ]);
        let dash = Args::parse_from([
            "vnesim",
            "--vnr-directory", "vnr",
            "--simulation-plan", "plan",
            "--data-directory", "out",
        ]);

        assert_eq!(underscore.vnr_directory, dash.vnr_directory);
        assert_eq!(underscore.simulation_plan, Some(PathBuf::from("plan")));
        assert_eq!(dash.data_directory, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_config_source_description() {
        assert_eq!(
            describe_config_source(Some(Path::new("run.yaml"))),
            "run.yaml with command-line overrides"
        );
        assert_eq!(
            describe_config_source(None),
            "defaults with command-line overrides"
        );
    }
}
