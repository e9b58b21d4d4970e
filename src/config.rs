//! Configuration for the aggregation pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main configuration for an aggregation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Input configuration
    pub input: InputConfig,

    /// Age filter bounds
    pub filter: FilterConfig,

    /// Processing configuration
    #[serde(default)]
    pub processing: ProcessingConfig,
}

/// Input data configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Path to the delimited-text input file
    pub path: PathBuf,

    /// Field delimiter (single ASCII character)
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

/// Inclusive age bounds; records outside are excluded from all buckets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Minimum age (inclusive)
    pub min_age: f64,

    /// Maximum age (inclusive)
    pub max_age: f64,
}

/// Processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Number of parallel workers (one partition each)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Read buffer size per worker, in bytes
    #[serde(default = "default_read_buffer_bytes")]
    pub read_buffer_bytes: usize,

    /// Enable periodic metrics reporting
    #[serde(default = "default_true")]
    pub enable_metrics: bool,

    /// Metrics reporting interval in seconds
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,

    /// Optional path to save metrics JSON after the run completes
    #[serde(default)]
    pub metrics_output_path: Option<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            read_buffer_bytes: default_read_buffer_bytes(),
            enable_metrics: true,
            metrics_interval_secs: default_metrics_interval(),
            metrics_output_path: None,
        }
    }
}

impl Config {
    /// Build a config for one input file with defaults for everything else.
    pub fn for_input(path: PathBuf, min_age: f64, max_age: f64, workers: usize) -> Self {
        Self {
            input: InputConfig {
                path,
                delimiter: default_delimiter(),
            },
            filter: FilterConfig { min_age, max_age },
            processing: ProcessingConfig {
                workers,
                ..ProcessingConfig::default()
            },
        }
    }

    /// Load configuration from a YAML or JSON file.
    /// Format is auto-detected from file extension (.yaml, .yml, or .json).
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config: Config = match ext {
            "json" => serde_json::from_str(&contents)
                .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))?,
            // YAML is a superset of JSON, so it is also the fallback
            _ => serde_yaml::from_str(&contents)
                .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))?,
        };
        Ok(config)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Validate the configuration. Runs before any partitioning or I/O.
    pub fn validate(&self) -> Result<()> {
        if self.processing.workers == 0 {
            return Err(Error::InvalidConfig(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.processing.read_buffer_bytes == 0 {
            return Err(Error::InvalidConfig(
                "read buffer size must be > 0".to_string(),
            ));
        }
        if self.filter.min_age > self.filter.max_age {
            return Err(Error::InvalidConfig(format!(
                "min_age ({}) must not exceed max_age ({})",
                self.filter.min_age, self.filter.max_age
            )));
        }
        if !self.input.delimiter.is_ascii() || matches!(self.input.delimiter, '\n' | '\r') {
            return Err(Error::InvalidConfig(format!(
                "delimiter must be a single ASCII character, got {:?}",
                self.input.delimiter
            )));
        }
        Ok(())
    }
}

// Default value functions for serde
fn default_delimiter() -> char {
    ','
}
fn default_workers() -> usize {
    4
}
fn default_read_buffer_bytes() -> usize {
    64 * 1024
}
fn default_true() -> bool {
    true
}
fn default_metrics_interval() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config::for_input(PathBuf::from("people.csv"), 18.0, 65.0, 4)
    }

    #[test]
    fn test_for_input_defaults() {
        let config = base_config();
        assert_eq!(config.input.delimiter, ',');
        assert_eq!(config.processing.workers, 4);
        assert_eq!(config.processing.read_buffer_bytes, 64 * 1024);
        assert!(config.processing.enable_metrics);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_workers() {
        let mut config = base_config();
        config.processing.workers = 0;
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_inverted_age_bounds() {
        let mut config = base_config();
        config.filter.min_age = 70.0;
        config.filter.max_age = 18.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_delimiter() {
        let mut config = base_config();
        config.input.delimiter = '\n';
        assert!(config.validate().is_err());

        config.input.delimiter = 'é';
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_yaml() {
        let config = Config::from_yaml(
            r#"
input:
  path: "data/people.csv"
  delimiter: ";"
filter:
  min_age: 21
  max_age: 60
processing:
  workers: 8
"#,
        )
        .unwrap();

        assert_eq!(config.input.path, PathBuf::from("data/people.csv"));
        assert_eq!(config.input.delimiter, ';');
        assert_eq!(config.filter.min_age, 21.0);
        assert_eq!(config.processing.workers, 8);
        // Unspecified processing fields come from the defaults
        assert_eq!(config.processing.metrics_interval_secs, 10);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = base_config();
        let yaml = config.to_yaml().unwrap();
        let parsed = Config::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.input.path, config.input.path);
        assert_eq!(parsed.processing.workers, config.processing.workers);
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = Config::from_yaml("input: [not, a, struct]").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
