//! In-memory subscription tables
//!
//! Decides what reaches each federate and writes the `Deliver` callback.
//! Interactions are filtered by class; attribute updates are trimmed to the
//! subscribed attributes of a known object instance.

use dashmap::{DashMap, DashSet};
use log::trace;
use rti_core::{
    AttributeHandle, Callback, FederateHandle, InteractionClassHandle, Message, MessagePayload,
    ObjectInstanceHandle, OrderType,
};
use rti_ports::{CallbackSink, LogicalTime, MessageDelivery};
use std::collections::HashSet;
use std::sync::Arc;

pub struct InMemorySubscriptions<T> {
    /// Federates receiving every message untrimmed
    wildcard: DashSet<FederateHandle>,
    interactions: DashMap<FederateHandle, HashSet<InteractionClassHandle>>,
    /// Subscribed attributes of each object instance a federate knows
    objects: DashMap<(FederateHandle, ObjectInstanceHandle), HashSet<AttributeHandle>>,
    callbacks: Arc<dyn CallbackSink<T>>,
}

impl<T> InMemorySubscriptions<T> {
    pub fn new(callbacks: Arc<dyn CallbackSink<T>>) -> Self {
        Self {
            wildcard: DashSet::new(),
            interactions: DashMap::new(),
            objects: DashMap::new(),
            callbacks,
        }
    }

    pub fn subscribe_all(&self, federate: FederateHandle) {
        self.wildcard.insert(federate);
    }

    pub fn subscribe_interaction_class(
        &self,
        federate: FederateHandle,
        interaction_class: InteractionClassHandle,
    ) {
        self.interactions
            .entry(federate)
            .or_default()
            .insert(interaction_class);
    }

    pub fn unsubscribe_interaction_class(
        &self,
        federate: FederateHandle,
        interaction_class: InteractionClassHandle,
    ) {
        if let Some(mut classes) = self.interactions.get_mut(&federate) {
            classes.remove(&interaction_class);
        }
    }

    pub fn subscribe_object_attributes(
        &self,
        federate: FederateHandle,
        object_instance: ObjectInstanceHandle,
        attributes: impl IntoIterator<Item = AttributeHandle>,
    ) {
        self.objects
            .entry((federate, object_instance))
            .or_default()
            .extend(attributes);
    }

    pub fn unsubscribe_object(&self, federate: FederateHandle, object_instance: ObjectInstanceHandle) {
        self.objects.remove(&(federate, object_instance));
    }

    /// Forget everything about a resigned federate
    pub fn remove_federate(&self, federate: FederateHandle) {
        self.wildcard.remove(&federate);
        self.interactions.remove(&federate);
        self.objects.retain(|(subscriber, _), _| *subscriber != federate);
    }

    fn accepts(&self, federate: FederateHandle, payload: &MessagePayload) -> bool {
        if self.wildcard.contains(&federate) {
            return true;
        }

        match payload {
            MessagePayload::SendInteraction {
                interaction_class, ..
            } => self
                .interactions
                .get(&federate)
                .is_some_and(|classes| classes.contains(interaction_class)),
            MessagePayload::UpdateAttributeValues {
                object_instance,
                attributes,
            } => self
                .objects
                .get(&(federate, *object_instance))
                .is_some_and(|subscribed| {
                    attributes
                        .iter()
                        .any(|(attribute, _)| subscribed.contains(attribute))
                }),
            MessagePayload::DeleteObjectInstance { object_instance } => self
                .objects
                .contains_key(&(federate, *object_instance)),
        }
    }

    /// Copy of `payload` holding only what `federate` subscribed to
    fn trim(&self, federate: FederateHandle, payload: &MessagePayload) -> MessagePayload {
        match payload {
            MessagePayload::UpdateAttributeValues {
                object_instance,
                attributes,
            } if !self.wildcard.contains(&federate) => {
                let attributes = match self.objects.get(&(federate, *object_instance)) {
                    Some(subscribed) => attributes
                        .iter()
                        .filter(|(attribute, _)| subscribed.contains(attribute))
                        .cloned()
                        .collect(),
                    None => Vec::new(),
                };
                MessagePayload::UpdateAttributeValues {
                    object_instance: *object_instance,
                    attributes,
                }
            }
            _ => payload.clone(),
        }
    }
}

impl<T: LogicalTime> MessageDelivery<T> for InMemorySubscriptions<T> {
    fn would_deliver(&self, federate: FederateHandle, message: &Message<T>) -> bool {
        self.accepts(federate, &message.payload)
    }

    fn deliver(
        &self,
        federate: FederateHandle,
        message: &Message<T>,
        received_order: OrderType,
    ) -> bool {
        if !self.accepts(federate, &message.payload) {
            trace!("{}: not subscribed, skipping message from {}", federate, message.producer);
            return false;
        }

        let trimmed = Message {
            producer: message.producer,
            sent_order: message.sent_order,
            payload: self.trim(federate, &message.payload),
        };

        if let MessagePayload::DeleteObjectInstance { object_instance } = message.payload {
            self.objects.remove(&(federate, object_instance));
        }

        self.callbacks.write(
            federate,
            Callback::Deliver {
                message: trimmed,
                received_order,
            },
        );
        true
    }
}
