use serde::Deserialize;
use std::path::Path;

use crate::config::ConfigError;
use crate::simulation::ensemble::ForecastModel;

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_tick_rate")]
    pub tick_rate_hz: f32,
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u32,
    #[serde(default = "default_genesis_max_attempts")]
    pub genesis_max_attempts: u32,
    #[serde(default = "default_forecast_interval")]
    pub forecast_interval: u32,
    #[serde(default = "default_forecast_horizon")]
    pub forecast_horizon: u32,
    #[serde(default = "default_forecast_models")]
    pub forecast_models: Vec<ForecastModel>,
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: u32,
    /// Snapshots kept per storm
    #[serde(default = "default_max_snapshots")]
    pub max_snapshots: u32,
    #[serde(default = "default_snapshot_directory")]
    pub snapshot_directory: String,
    /// JSON polygon file; open ocean when unset
    #[serde(default)]
    pub landmass_file: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_tick_rate() -> f32 {
    5.0
}
fn default_max_ticks() -> u32 {
    2000
}
fn default_genesis_max_attempts() -> u32 {
    1000
}
fn default_forecast_interval() -> u32 {
    1
}
fn default_forecast_horizon() -> u32 {
    24
}
fn default_forecast_models() -> Vec<ForecastModel> {
    vec![ForecastModel::default()]
}
fn default_snapshot_interval() -> u32 {
    50
}
fn default_max_snapshots() -> u32 {
    10
}
fn default_snapshot_directory() -> String {
    "./snapshots".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            tick_rate_hz: default_tick_rate(),
            max_ticks: default_max_ticks(),
            genesis_max_attempts: default_genesis_max_attempts(),
            forecast_interval: default_forecast_interval(),
            forecast_horizon: default_forecast_horizon(),
            forecast_models: default_forecast_models(),
            snapshot_interval: default_snapshot_interval(),
            max_snapshots: default_max_snapshots(),
            snapshot_directory: default_snapshot_directory(),
            landmass_file: None,
            log_level: default_log_level(),
        }
    }
}

impl SimulationConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, ConfigError> {
        let config: SimulationConfig =
            toml::from_str(content).map_err(|source| ConfigError::Parse {
                path: source_path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.tick_rate_hz <= 0.0 {
            errors.push(format!(
                "tick_rate_hz must be > 0.0, got {}. Example: tick_rate_hz = 5.0",
                self.tick_rate_hz
            ));
        }

        if self.max_ticks == 0 {
            errors.push(format!(
                "max_ticks must be > 0, got {}. Example: max_ticks = 2000",
                self.max_ticks
            ));
        }

        if self.genesis_max_attempts == 0 {
            errors.push(format!(
                "genesis_max_attempts must be > 0, got {}. Example: genesis_max_attempts = 1000",
                self.genesis_max_attempts
            ));
        }

        if self.forecast_interval == 0 {
            errors.push(format!(
                "forecast_interval must be > 0, got {}. Example: forecast_interval = 1",
                self.forecast_interval
            ));
        }

        if self.forecast_horizon == 0 {
            errors.push(format!(
                "forecast_horizon must be > 0, got {}. Example: forecast_horizon = 24",
                self.forecast_horizon
            ));
        }

        for (i, model) in self.forecast_models.iter().enumerate() {
            if model.name.trim().is_empty() {
                errors.push(format!(
                    "forecast_models[{}].name must not be empty. Example: name = \"ENAI\"",
                    i
                ));
            }
            if !model.bias_u.is_finite() || !model.bias_v.is_finite() {
                errors.push(format!(
                    "forecast_models[{}] bias must be finite, got ({}, {}). Example: bias_u = 0.5",
                    i, model.bias_u, model.bias_v
                ));
            }
        }

        if self.snapshot_interval == 0 {
            errors.push(format!(
                "snapshot_interval must be > 0, got {}. Example: snapshot_interval = 50",
                self.snapshot_interval
            ));
        }

        if self.max_snapshots == 0 {
            errors.push(format!(
                "max_snapshots must be > 0, got {}. Example: max_snapshots = 10",
                self.max_snapshots
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got '{}'. Example: log_level = \"info\"",
                valid_levels, self.log_level
            ));
        }

        ConfigError::from_messages(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn test_path() -> PathBuf {
        PathBuf::from("test-config.toml")
    }

    fn err_string(toml: &str) -> String {
        SimulationConfig::from_toml_str(toml, &test_path())
            .unwrap_err()
            .to_string()
    }

    #[test]
    fn valid_config_loads_all_fields() {
        let toml = r#"
            tick_rate_hz = 2.0
            max_ticks = 500
            genesis_max_attempts = 200
            forecast_interval = 4
            forecast_horizon = 16
            snapshot_interval = 25
            max_snapshots = 5
            snapshot_directory = "./data/snapshots"
            landmass_file = "./data/land.json"
            log_level = "debug"

            [[forecast_models]]
            name = "ENAI"
            bias_u = 0.5
            bias_v = -0.5

            [[forecast_models]]
            name = "EAST"
            bias_u = 2.0
            bias_v = 0.0
        "#;
        let config = SimulationConfig::from_toml_str(toml, &test_path()).unwrap();
        assert_eq!(config.tick_rate_hz, 2.0);
        assert_eq!(config.max_ticks, 500);
        assert_eq!(config.genesis_max_attempts, 200);
        assert_eq!(config.forecast_interval, 4);
        assert_eq!(config.forecast_horizon, 16);
        assert_eq!(config.snapshot_interval, 25);
        assert_eq!(config.max_snapshots, 5);
        assert_eq!(config.snapshot_directory, "./data/snapshots");
        assert_eq!(config.landmass_file.as_deref(), Some("./data/land.json"));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.forecast_models.len(), 2);
        assert_eq!(config.forecast_models[1].name, "EAST");
        assert_eq!(config.forecast_models[1].bias_u, 2.0);
    }

    #[test]
    fn defaults_applied_for_empty_config() {
        let config = SimulationConfig::from_toml_str("", &test_path()).unwrap();
        assert_eq!(config.tick_rate_hz, 5.0);
        assert_eq!(config.max_ticks, 2000);
        assert_eq!(config.genesis_max_attempts, 1000);
        assert_eq!(config.forecast_interval, 1);
        assert_eq!(config.forecast_horizon, 24);
        assert_eq!(config.snapshot_interval, 50);
        assert_eq!(config.max_snapshots, 10);
        assert_eq!(config.snapshot_directory, "./snapshots");
        assert!(config.landmass_file.is_none());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.forecast_models.len(), 1);
        assert_eq!(config.forecast_models[0].name, "ENAI");
        assert_eq!(config.forecast_models[0].bias_u, 0.5);
        assert_eq!(config.forecast_models[0].bias_v, -0.5);
    }

    #[test]
    fn invalid_tick_rate_rejected() {
        let err = err_string("tick_rate_hz = -1.0");
        assert!(err.contains("tick_rate_hz"));
        assert!(err.contains("> 0.0"));
    }

    #[test]
    fn zero_genesis_attempts_rejected() {
        let err = err_string("genesis_max_attempts = 0");
        assert!(err.contains("genesis_max_attempts"));
    }

    #[test]
    fn unnamed_forecast_model_rejected() {
        let err = err_string("[[forecast_models]]\nname = \"\"\nbias_u = 0.0\nbias_v = 0.0");
        assert!(err.contains("forecast_models[0].name"), "{}", err);
    }

    #[test]
    fn invalid_log_level_rejected() {
        let err = err_string(r#"log_level = "verbose""#);
        assert!(err.contains("log_level"));
    }

    #[test]
    fn multiple_errors_reported_together() {
        let err = err_string("tick_rate_hz = 0.0\nsnapshot_interval = 0\nforecast_horizon = 0");
        assert!(err.contains("tick_rate_hz"));
        assert!(err.contains("snapshot_interval"));
        assert!(err.contains("forecast_horizon"));
    }

    #[test]
    fn malformed_toml_includes_source_path() {
        let err = err_string("tick_rate_hz = [invalid");
        assert!(err.contains("test-config.toml"));
    }

    #[test]
    fn from_file_loads_valid_config() {
        let mut tmp = NamedTempFile::new().unwrap();
        use std::io::Write;
        writeln!(tmp, "tick_rate_hz = 10.0").unwrap();
        let config = SimulationConfig::from_file(tmp.path()).unwrap();
        assert_eq!(config.tick_rate_hz, 10.0);
    }

    #[test]
    fn from_file_missing_file_error() {
        let err = SimulationConfig::from_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(err.to_string().contains("Cannot read"));
    }
}
