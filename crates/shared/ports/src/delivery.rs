use rti_core::{Callback, FederateHandle, Message, OrderType};

/// Port for subscription filtering and the actual transport write
///
/// The time-management core only ever looks at the boolean results;
/// trimming, region matching and object discovery all live behind this trait.
pub trait MessageDelivery<T>: Send + Sync {
    /// Would anything reach `federate` if `message` were delivered now?
    fn would_deliver(&self, federate: FederateHandle, message: &Message<T>) -> bool;

    /// Filter and deliver `message` to `federate`; returns whether anything
    /// was actually sent
    fn deliver(
        &self,
        federate: FederateHandle,
        message: &Message<T>,
        received_order: OrderType,
    ) -> bool;
}

/// Port for pushing callbacks to a federate
///
/// Fire-and-forget: implementations must not block waiting for the federate.
pub trait CallbackSink<T>: Send + Sync {
    fn write(&self, federate: FederateHandle, callback: Callback<T>);
}
