//! Per-federate time management: the TSO queue, the delivered-message
//! registry and the advance-request state machine that uses both.

pub mod federate_time;
pub mod retractable;
pub mod tso_queue;

pub use federate_time::{
    AdvanceRequest, Collaborators, FederateTimeState, FederateTimeStatus, Receipt,
    RetractOutcome,
};
pub use retractable::RetractableRegistry;
pub use tso_queue::{QueuedMessage, TimeStampOrderedQueue};
