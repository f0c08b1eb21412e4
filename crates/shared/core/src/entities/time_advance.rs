use serde::{Deserialize, Serialize};

/// Kind of time advance a federate asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeAdvanceType {
    #[default]
    None,
    TimeAdvanceRequest,
    TimeAdvanceRequestAvailable,
    NextMessageRequest,
    NextMessageRequestAvailable,
    FlushQueueRequest,
}

impl TimeAdvanceType {
    /// Returns true for the "available" variants, which may be granted at a
    /// time equal to GALT and may still receive messages at the granted time
    pub fn is_available(&self) -> bool {
        matches!(
            self,
            TimeAdvanceType::TimeAdvanceRequestAvailable
                | TimeAdvanceType::NextMessageRequestAvailable
        )
    }

    /// Short protocol name used in logs
    pub fn abbreviation(&self) -> &'static str {
        match self {
            TimeAdvanceType::None => "none",
            TimeAdvanceType::TimeAdvanceRequest => "TAR",
            TimeAdvanceType::TimeAdvanceRequestAvailable => "TARA",
            TimeAdvanceType::NextMessageRequest => "NMR",
            TimeAdvanceType::NextMessageRequestAvailable => "NMRA",
            TimeAdvanceType::FlushQueueRequest => "FQR",
        }
    }
}
