use crate::config::SimulationConfig;
use crate::schedule::Timestamp;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Load and parse configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<SimulationConfig> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration '{}'", config_path.display()))?;

    let config: SimulationConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration '{}'", config_path.display()))?;

    Ok(config)
}

/// Command-line values that take precedence over the YAML file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub executable: Option<String>,
    pub phys_topology: Option<PathBuf>,
    pub vnr_directory: Option<PathBuf>,
    pub simulation_plan: Option<PathBuf>,
    pub max_simulation_time: Option<Timestamp>,
    pub data_directory: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Apply CLI overrides and validate the result
pub fn apply_overrides(config: &mut SimulationConfig, overrides: &CliOverrides) -> Result<()> {
    if let Some(executable) = &overrides.executable {
        config.executable = Some(executable.clone());
    }
    if let Some(path) = &overrides.phys_topology {
        config.phys_topology = path.clone();
    }
    if let Some(path) = &overrides.vnr_directory {
        config.vnr_directory = path.clone();
    }
    if let Some(path) = &overrides.simulation_plan {
        config.simulation_plan = path.clone();
    }
    if let Some(max_time) = overrides.max_simulation_time {
        config.max_simulation_time = max_time;
    }
    if let Some(path) = &overrides.data_directory {
        config.data_directory = path.clone();
    }
    if let Some(level) = &overrides.log_level {
        config.log_level = level.clone();
    }

    config.validate()?;

    Ok(())
}

/// Build the effective configuration from an optional file plus overrides
pub fn resolve_config(config_path: Option<&Path>, overrides: &CliOverrides) -> Result<SimulationConfig> {
    let mut config = match config_path {
        Some(path) => load_config(path)?,
        None => SimulationConfig::default(),
    };
    apply_overrides(&mut config, overrides)?;
    Ok(config)
}
