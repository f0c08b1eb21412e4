use log::{info, warn};
use parking_lot::RwLock;
use rti_core::{FederateHandle, Message, MessageRetractionHandle};
use rti_ports::{CallbackSink, LogicalTime, MessageDelivery};
use std::sync::Arc;
use uuid::Uuid;

use super::coordinator::FederationTimeCoordinator;
use crate::domain::FederateTimeStatus;
use crate::error::Result;
use crate::infrastructure::{ConfigError, FederationConfig};

/// A federation execution's time management, shareable across threads
///
/// Every mutating operation runs under the write side of one task-fair
/// read/write lock; status queries take the read side.
pub struct Federation<T: LogicalTime> {
    id: Uuid,
    name: String,
    coordinator: RwLock<FederationTimeCoordinator<T>>,
}

impl<T: LogicalTime> Federation<T> {
    /// Create a federation; the configured time representation must be `T`'s
    pub fn new(
        config: &FederationConfig,
        delivery: Arc<dyn MessageDelivery<T>>,
        callbacks: Arc<dyn CallbackSink<T>>,
    ) -> std::result::Result<Self, ConfigError> {
        if config.time_representation.name() != T::representation() {
            return Err(ConfigError::Invalid(format!(
                "federation {} is configured for {} but created with {}",
                config.name,
                config.time_representation.name(),
                T::representation()
            )));
        }

        let id = Uuid::new_v4();
        info!(
            "Federation {} ({}) created with {}",
            config.name,
            id,
            T::representation()
        );

        Ok(Self {
            id,
            name: config.name.clone(),
            coordinator: RwLock::new(FederationTimeCoordinator::new(delivery, callbacks)),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn logged<R>(&self, operation: &str, federate: FederateHandle, result: Result<R>) -> Result<R> {
        if let Err(e) = &result {
            warn!("{}: {} rejected for {}: {}", self.name, operation, federate, e);
        }
        result
    }

    pub fn join(&self) -> FederateHandle {
        self.coordinator.write().join()
    }

    pub fn resign(&self, federate: FederateHandle) -> Result<()> {
        let result = self.coordinator.write().resign(federate);
        self.logged("resign", federate, result)
    }

    pub fn enable_time_regulation(
        &self,
        federate: FederateHandle,
        lookahead: T::Interval,
    ) -> Result<()> {
        let result = self
            .coordinator
            .write()
            .enable_time_regulation(federate, lookahead);
        self.logged("enable time regulation", federate, result)
    }

    pub fn disable_time_regulation(&self, federate: FederateHandle) -> Result<()> {
        let result = self.coordinator.write().disable_time_regulation(federate);
        self.logged("disable time regulation", federate, result)
    }

    pub fn modify_lookahead(&self, federate: FederateHandle, lookahead: T::Interval) -> Result<()> {
        let result = self
            .coordinator
            .write()
            .modify_lookahead(federate, lookahead);
        self.logged("modify lookahead", federate, result)
    }

    pub fn enable_time_constrained(&self, federate: FederateHandle) -> Result<()> {
        let result = self.coordinator.write().enable_time_constrained(federate);
        self.logged("enable time constrained", federate, result)
    }

    pub fn disable_time_constrained(&self, federate: FederateHandle) -> Result<()> {
        let result = self.coordinator.write().disable_time_constrained(federate);
        self.logged("disable time constrained", federate, result)
    }

    pub fn time_advance_request(&self, federate: FederateHandle, time: T) -> Result<()> {
        let result = self.coordinator.write().time_advance_request(federate, time);
        self.logged("TAR", federate, result)
    }

    pub fn time_advance_request_available(&self, federate: FederateHandle, time: T) -> Result<()> {
        let result = self
            .coordinator
            .write()
            .time_advance_request_available(federate, time);
        self.logged("TARA", federate, result)
    }

    pub fn next_message_request(&self, federate: FederateHandle, time: T) -> Result<()> {
        let result = self.coordinator.write().next_message_request(federate, time);
        self.logged("NMR", federate, result)
    }

    pub fn next_message_request_available(&self, federate: FederateHandle, time: T) -> Result<()> {
        let result = self
            .coordinator
            .write()
            .next_message_request_available(federate, time);
        self.logged("NMRA", federate, result)
    }

    pub fn flush_queue_request(&self, federate: FederateHandle, time: T) -> Result<()> {
        let result = self.coordinator.write().flush_queue_request(federate, time);
        self.logged("FQR", federate, result)
    }

    pub fn send(&self, message: Message<T>) -> Result<()> {
        let producer = message.producer;
        let result = self.coordinator.write().send(message);
        self.logged("send", producer, result)
    }

    pub fn retract(&self, federate: FederateHandle, retraction: MessageRetractionHandle) -> Result<()> {
        let result = self.coordinator.write().retract(federate, retraction);
        self.logged("retract", federate, result)
    }

    pub fn galt(&self) -> Option<T> {
        self.coordinator.read().galt()
    }

    pub fn federates(&self) -> Vec<FederateHandle> {
        self.coordinator.read().federates()
    }

    pub fn status(&self, federate: FederateHandle) -> Result<FederateTimeStatus<T>> {
        self.coordinator.read().status(federate)
    }
}
