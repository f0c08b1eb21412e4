//! RTI Ports
//!
//! Port definitions (traits) for the run-time infrastructure.
//! These define the boundaries between the time-management core and
//! everything it treats as a collaborator: the time representation,
//! subscription filtering, and the transport that carries callbacks.

mod delivery;
mod error;
mod time;

pub use delivery::{CallbackSink, MessageDelivery};
pub use error::{TimeError, TimeResult};
pub use time::{LogicalTime, LogicalTimeInterval};
