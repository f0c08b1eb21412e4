use rti_core::FederateHandle;
use rti_ports::TimeError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FederationError {
    #[error("Federate not joined: {0}")]
    FederateNotJoined(FederateHandle),

    #[error("Time regulation already enabled: {0}")]
    TimeRegulationAlreadyEnabled(FederateHandle),

    #[error("Time regulation not enabled: {0}")]
    TimeRegulationNotEnabled(FederateHandle),

    #[error("Time constrained already enabled: {0}")]
    TimeConstrainedAlreadyEnabled(FederateHandle),

    #[error("Time constrained not enabled: {0}")]
    TimeConstrainedNotEnabled(FederateHandle),

    #[error("Request for time constrained pending: {0}")]
    RequestForTimeConstrainedPending(FederateHandle),

    #[error("In time advancing state: {0}")]
    InTimeAdvancingState(FederateHandle),

    #[error("Logical time already passed: {0}")]
    LogicalTimeAlreadyPassed(String),

    #[error("Invalid logical time: {0}")]
    InvalidLogicalTime(String),

    #[error("Invalid retraction handle: {0}")]
    InvalidRetractionHandle(String),

    #[error("Time error: {0}")]
    Time(#[from] TimeError),
}

pub type Result<T> = std::result::Result<T, FederationError>;
