use serde::{Deserialize, Serialize};

use super::{Message, OrderType};
use crate::values::MessageRetractionHandle;

/// Everything the RTI pushes to a federate
///
/// Written fire-and-forget through a `CallbackSink`; the core never waits
/// for acknowledgement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "callback", rename_all = "snake_case")]
pub enum Callback<T> {
    TimeRegulationEnabled { time: T },
    TimeConstrainedEnabled { time: T },
    TimeAdvanceGrant { time: T },
    GaltAdvanced { time: T },
    GaltUndefined,
    /// A message reached the federate, with the order it was received in
    Deliver {
        message: Message<T>,
        received_order: OrderType,
    },
    /// Best-effort retraction of a message that was already delivered
    Retract { handle: MessageRetractionHandle },
}

impl<T> Callback<T> {
    /// Short name used in logs and reports
    pub fn name(&self) -> &'static str {
        match self {
            Callback::TimeRegulationEnabled { .. } => "time_regulation_enabled",
            Callback::TimeConstrainedEnabled { .. } => "time_constrained_enabled",
            Callback::TimeAdvanceGrant { .. } => "time_advance_grant",
            Callback::GaltAdvanced { .. } => "galt_advanced",
            Callback::GaltUndefined => "galt_undefined",
            Callback::Deliver { .. } => "deliver",
            Callback::Retract { .. } => "retract",
        }
    }
}
