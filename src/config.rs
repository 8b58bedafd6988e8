//! Traversal configuration
//!
//! Every field has a default; a YAML document only needs the keys it changes.
//!
//! ```yaml
//! max_iterations: 5000
//! max_concurrency: 8
//! pass_through_models:
//!   - dtmi:com:willowinc:HVACZone;1
//! ```

use crate::twin::ModelId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const HVAC_ZONE_MODEL: &str = "dtmi:com:willowinc:HVACZone;1";
pub const OCCUPANCY_ZONE_MODEL: &str = "dtmi:com:willowinc:OccupancyZone;1";
pub const INFERRED_OCCUPANCY_SENSOR_MODEL: &str = "dtmi:com:willowinc:InferredOccupancySensor;1";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Tunables shared by the semantic graph builder, the tree builder and the facade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Maximum dequeues of the semantic graph builder before it stops early
    pub max_iterations: usize,
    /// Page size for twins-by-model queries
    pub page_size: usize,
    /// Maximum concurrent per-twin tasks inside one tree wave
    pub max_concurrency: usize,
    /// Seed token that expands to every twin of `top_level_models`
    pub all_sentinel: String,
    pub top_level_models: Vec<ModelId>,
    /// Zone-like models re-expanded in the unrestricted mode
    pub pass_through_models: Vec<ModelId>,
    pub occupancy_zone_model: ModelId,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            page_size: 100,
            max_concurrency: 16,
            all_sentinel: "all".to_string(),
            top_level_models: [
                "dtmi:com:willowinc:Portfolio;1",
                "dtmi:com:willowinc:Building;1",
                "dtmi:com:willowinc:Land;1",
                "dtmi:com:willowinc:Floor;1",
                "dtmi:com:willowinc:mining:System;1",
                "dtmi:com:willowinc:Equipment;1",
            ]
            .into_iter()
            .map(ModelId::from)
            .collect(),
            pass_through_models: [
                HVAC_ZONE_MODEL,
                OCCUPANCY_ZONE_MODEL,
                INFERRED_OCCUPANCY_SENSOR_MODEL,
            ]
            .into_iter()
            .map(ModelId::from)
            .collect(),
            occupancy_zone_model: ModelId::from(OCCUPANCY_ZONE_MODEL),
        }
    }
}

impl TraversalConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: TraversalConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid("max_iterations must be greater than 0".to_string()));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be greater than 0".to_string()));
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid("max_concurrency must be greater than 0".to_string()));
        }
        if self.all_sentinel.is_empty() {
            return Err(ConfigError::Invalid("all_sentinel must not be empty".to_string()));
        }
        Ok(())
    }

    /// Builder-style override of the iteration cap
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn is_pass_through(&self, model: &ModelId) -> bool {
        self.pass_through_models.contains(model)
    }

    pub fn is_occupancy_zone(&self, model: &ModelId) -> bool {
        &self.occupancy_zone_model == model
    }
}
