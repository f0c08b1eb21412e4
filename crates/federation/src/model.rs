// Re-export the domain types callers of the federation work with
pub use rti_core::{
    AttributeHandle, Callback, FederateHandle, InteractionClassHandle, Message, MessagePayload,
    MessageRetractionHandle, ObjectInstanceHandle, OrderType, ParameterHandle, SentOrder,
    TimeAdvanceType,
};
pub use rti_ports::{CallbackSink, LogicalTime, LogicalTimeInterval, MessageDelivery, TimeError};
pub use rti_time::{Float64Interval, Float64Time, Integer64Interval, Integer64Time};

pub use crate::domain::{AdvanceRequest, FederateTimeStatus};
