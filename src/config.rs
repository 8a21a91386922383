use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::schedule::Timestamp;

/// Simulation run configuration.
///
/// Every field except `executable` has a default matching the layout the
/// workload generator produces, so a YAML file only needs to name what
/// differs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Solver executable invoked for every arrival
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,
    /// Substrate topology, read at start and overwritten after every change
    pub phys_topology: PathBuf,
    /// Directory holding the per-request files
    pub vnr_directory: PathBuf,
    /// Simulation plan (`arrival,departure,vn_id` per line)
    pub simulation_plan: PathBuf,
    /// Departures after this time are never scheduled
    pub max_simulation_time: Timestamp,
    /// Output directory for utilization snapshots, results log and summary
    pub data_directory: PathBuf,
    pub log_level: String,
    /// Verify ledger/residual conservation after every state change
    pub check_invariants: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            executable: None,
            phys_topology: PathBuf::from("sn.txt"),
            vnr_directory: PathBuf::from("vnr"),
            simulation_plan: PathBuf::from("vnr-simulation"),
            max_simulation_time: 1000,
            data_directory: PathBuf::from("sim-data"),
            log_level: "info".to_string(),
            check_invariants: true,
        }
    }
}

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

impl SimulationConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.executable {
            None => {
                return Err(ValidationError::InvalidSolver(
                    "executable must be provided".to_string(),
                ))
            }
            Some(executable) if executable.trim().is_empty() => {
                return Err(ValidationError::InvalidSolver(
                    "executable cannot be empty".to_string(),
                ))
            }
            Some(_) => {}
        }

        for (name, path) in [
            ("phys_topology", &self.phys_topology),
            ("vnr_directory", &self.vnr_directory),
            ("simulation_plan", &self.simulation_plan),
            ("data_directory", &self.data_directory),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ValidationError::InvalidPath(format!("{} cannot be empty", name)));
            }
        }

        if self.max_simulation_time < 0 {
            return Err(ValidationError::InvalidGeneral(format!(
                "max_simulation_time must not be negative, got {}",
                self.max_simulation_time
            )));
        }

        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidGeneral(format!(
                "unknown log_level '{}'",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Solver executable, if configured
    pub fn executable(&self) -> Option<&str> {
        self.executable.as_deref()
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid solver configuration: {0}")]
    InvalidSolver(String),
    #[error("Invalid path configuration: {0}")]
    InvalidPath(String),
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> SimulationConfig {
        SimulationConfig {
            executable: Some("./vne_protection".to_string()),
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = SimulationConfig::default();
        assert_eq!(config.phys_topology, PathBuf::from("sn.txt"));
        assert_eq!(config.vnr_directory, PathBuf::from("vnr"));
        assert_eq!(config.simulation_plan, PathBuf::from("vnr-simulation"));
        assert_eq!(config.max_simulation_time, 1000);
        assert_eq!(config.data_directory, PathBuf::from("sim-data"));
        assert!(config.check_invariants);
    }

    #[test]
    fn test_validate() {
        assert!(valid().validate().is_ok());

        let missing = SimulationConfig::default();
        assert!(matches!(missing.validate(), Err(ValidationError::InvalidSolver(_))));

        let mut empty_path = valid();
        empty_path.vnr_directory = PathBuf::new();
        assert!(matches!(empty_path.validate(), Err(ValidationError::InvalidPath(_))));

        let mut negative = valid();
        negative.max_simulation_time = -1;
        assert!(matches!(negative.validate(), Err(ValidationError::InvalidGeneral(_))));

        let mut level = valid();
        level.log_level = "loud".to_string();
        assert!(level.validate().is_err());
        level.log_level = "DEBUG".to_string();
        assert!(level.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
executable: "./vne_protection"
max_simulation_time: 500
"#;
        let config: SimulationConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.executable(), Some("./vne_protection"));
        assert_eq!(config.max_simulation_time, 500);
        assert_eq!(config.phys_topology, PathBuf::from("sn.txt"));
        assert_eq!(config.log_level, "info");
    }
}
