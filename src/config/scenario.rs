use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::config::ConfigError;
use crate::world::basin::Basin;

/// Month used when a scenario names one outside 1-12.
pub const FALLBACK_MONTH: u32 = 8;

/// Parameters that define a storm scenario.
/// Stored with the simulation for reproducibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParams {
    /// 0 picks a random seed; the resolved seed is stored
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_basin")]
    pub basin: String,
    #[serde(default = "default_month")]
    pub month: u32,
    /// Global mean surface temperature in Kelvin
    #[serde(default = "default_global_temp")]
    pub global_temp: f64,
    /// Tunable shear strength; 100 is the climatological baseline
    #[serde(default = "default_global_shear")]
    pub global_shear: f64,
}

fn default_basin() -> String {
    "WPAC".to_string()
}
fn default_month() -> u32 {
    8
}
fn default_global_temp() -> f64 {
    289.0
}
fn default_global_shear() -> f64 {
    100.0
}

impl Default for ScenarioParams {
    fn default() -> Self {
        ScenarioParams {
            seed: 0,
            basin: default_basin(),
            month: default_month(),
            global_temp: default_global_temp(),
            global_shear: default_global_shear(),
        }
    }
}

/// Clamp a month to 1-12, falling back to August otherwise.
pub fn resolve_month(month: u32) -> u32 {
    if (1..=12).contains(&month) {
        month
    } else {
        warn!(month, fallback = FALLBACK_MONTH, "Invalid month");
        FALLBACK_MONTH
    }
}

impl ScenarioParams {
    /// Load scenario parameters from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, ConfigError> {
        let params: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: source_path.to_path_buf(),
            source,
        })?;
        params.validate()?;
        Ok(params)
    }

    /// Validate the numeric ranges. Unknown basins and months are not errors:
    /// they resolve to defaults with a warning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if !(250.0..=330.0).contains(&self.global_temp) {
            errors.push(format!(
                "global_temp must be 250-330 K, got {}. Example: global_temp = 289.0",
                self.global_temp
            ));
        }

        if !(0.0..=300.0).contains(&self.global_shear) {
            errors.push(format!(
                "global_shear must be 0-300, got {}. Example: global_shear = 100.0",
                self.global_shear
            ));
        }

        ConfigError::from_messages(errors)
    }

    pub fn basin(&self) -> Basin {
        Basin::from_code(&self.basin)
    }

    pub fn month(&self) -> u32 {
        resolve_month(self.month)
    }
}
