//! RTI Core Domain
//!
//! Pure domain types shared by every crate of the run-time infrastructure:
//! handles, message envelopes and the callbacks a federate receives.
//! This crate contains no async, no I/O, and is 100% unit testable.
//!
//! Logical time itself is not defined here; messages and callbacks are generic
//! over the time type so that the time domain stays a port (see `rti-ports`).

pub mod entities;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    // Callbacks delivered to federates
    Callback,
    // Message envelopes
    Message,
    MessagePayload,
    OrderType,
    SentOrder,
    // Time advancement
    TimeAdvanceType,
};
pub use values::{
    AttributeHandle, FederateHandle, InteractionClassHandle, MessageRetractionHandle,
    ObjectInstanceHandle, ParameterHandle,
};
