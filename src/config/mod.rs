use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::telemetry::TelemetryConfig;
use crate::utils::constants::DEFAULT_TIMESTEP;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),
    #[error("Invalid simulation configuration: {0}")]
    ValidationError(String),
}

/// Run configuration for the simulation and its telemetry service.
///
/// Every field has a default, so a partial (or empty) YAML document is a
/// valid configuration. Runtime setters clamp bad values; configuration
/// files are the one input surface that is validated instead, because a
/// broken file is a caller error worth surfacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Simulation tick period [s], must be positive
    pub timestep: f64,
    /// Telemetry service settings
    pub telemetry: TelemetryConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            timestep: DEFAULT_TIMESTEP,
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.timestep.is_finite() || self.timestep <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "timestep must be positive, got {}",
                self.timestep
            )));
        }
        Ok(())
    }
}
