use thiserror::Error;

/// Errors raised by logical time arithmetic and construction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeError {
    #[error("Illegal time arithmetic: {0}")]
    IllegalTimeArithmetic(String),

    #[error("Invalid logical time interval: {0}")]
    InvalidInterval(String),

    #[error("Invalid logical time: {0}")]
    InvalidTime(String),
}

pub type TimeResult<T> = std::result::Result<T, TimeError>;
