use rti_federation::{ConfigError, FederationError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scenario parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown federate: {0}")]
    UnknownFederate(String),

    #[error("Duplicate federate: {0}")]
    DuplicateFederate(String),

    #[error("Unknown retraction tag: {0}")]
    UnknownRetraction(String),

    #[error("Step {step} ({op}) failed: {source}")]
    Step {
        step: usize,
        op: &'static str,
        #[source]
        source: FederationError,
    },

    #[error("Step {step} ({op}) was expected to fail")]
    UnexpectedSuccess { step: usize, op: &'static str },

    #[error("Callback collector failed: {0}")]
    Collector(String),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
