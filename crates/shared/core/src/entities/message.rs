use serde::{Deserialize, Serialize};

use super::OrderType;
use crate::values::{
    AttributeHandle, FederateHandle, InteractionClassHandle, MessageRetractionHandle,
    ObjectInstanceHandle, ParameterHandle,
};

/// What a message carries. Opaque to the time-management core; only the
/// subscription collaborator looks inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessagePayload {
    SendInteraction {
        interaction_class: InteractionClassHandle,
        #[serde(default)]
        parameters: Vec<(ParameterHandle, Vec<u8>)>,
    },
    UpdateAttributeValues {
        object_instance: ObjectInstanceHandle,
        #[serde(default)]
        attributes: Vec<(AttributeHandle, Vec<u8>)>,
    },
    DeleteObjectInstance {
        object_instance: ObjectInstanceHandle,
    },
}

/// Order a message was sent with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentOrder<T> {
    Receive,
    Timestamp {
        time: T,
        retraction: MessageRetractionHandle,
    },
}

/// A message produced by a federate and routed to every other federate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message<T> {
    pub producer: FederateHandle,
    pub sent_order: SentOrder<T>,
    pub payload: MessagePayload,
}

impl<T: Copy> Message<T> {
    /// Create a receive-order message
    pub fn receive_order(producer: FederateHandle, payload: MessagePayload) -> Self {
        Self {
            producer,
            sent_order: SentOrder::Receive,
            payload,
        }
    }

    /// Create a timestamp-order message
    pub fn timestamp_order(
        producer: FederateHandle,
        time: T,
        retraction: MessageRetractionHandle,
        payload: MessagePayload,
    ) -> Self {
        Self {
            producer,
            sent_order: SentOrder::Timestamp { time, retraction },
            payload,
        }
    }

    pub fn order_type(&self) -> OrderType {
        match self.sent_order {
            SentOrder::Receive => OrderType::Receive,
            SentOrder::Timestamp { .. } => OrderType::Timestamp,
        }
    }

    /// Logical time of a timestamp-order message
    pub fn time(&self) -> Option<T> {
        match self.sent_order {
            SentOrder::Receive => None,
            SentOrder::Timestamp { time, .. } => Some(time),
        }
    }

    pub fn retraction(&self) -> Option<MessageRetractionHandle> {
        match self.sent_order {
            SentOrder::Receive => None,
            SentOrder::Timestamp { retraction, .. } => Some(retraction),
        }
    }

    /// Same message, downgraded to receive order
    ///
    /// Used when the sender is not time-regulating: its timestamp carries no
    /// ordering guarantee for anyone.
    pub fn into_receive_order(self) -> Self {
        Self {
            sent_order: SentOrder::Receive,
            ..self
        }
    }
}
