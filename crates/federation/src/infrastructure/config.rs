//! Configuration loading for a federation
//!
//! Supports JSON configuration with:
//! - Federation name
//! - Logical time representation
//! - Default log filter

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Logical time representation used by every federate of a federation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRepresentation {
    #[default]
    Integer64,
    Float64,
}

impl TimeRepresentation {
    /// Standard representation name
    pub fn name(&self) -> &'static str {
        match self {
            TimeRepresentation::Integer64 => "HLAinteger64Time",
            TimeRepresentation::Float64 => "HLAfloat64Time",
        }
    }
}

/// Root configuration for a federation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FederationConfig {
    /// Federation execution name
    #[serde(default = "default_federation_name")]
    pub name: String,

    #[serde(default)]
    pub time_representation: TimeRepresentation,

    /// Default log filter when RUST_LOG is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_federation_name() -> String {
    "Federation".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            name: default_federation_name(),
            time_representation: TimeRepresentation::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl FederationConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "federation name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let config = FederationConfig::from_json("{}").unwrap();
        assert_eq!(config, FederationConfig::default());
        assert_eq!(config.time_representation.name(), "HLAinteger64Time");
    }

    #[test]
    fn test_parse_float_federation() {
        let config = FederationConfig::from_json(
            r#"{"name": "Pursuit", "time_representation": "float64", "log_filter": "debug"}"#,
        )
        .unwrap();

        assert_eq!(config.name, "Pursuit");
        assert_eq!(config.time_representation, TimeRepresentation::Float64);
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            FederationConfig::from_json(r#"{"time_representation": "decimal"}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            FederationConfig::from_json(r#"{"name": " "}"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            FederationConfig::from_file("/nonexistent/federation.json"),
            Err(ConfigError::Io { .. })
        ));
    }
}
