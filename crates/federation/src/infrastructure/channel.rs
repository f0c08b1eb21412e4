//! Tokio channel-based callback transport for single-process mode
//!
//! Each federate gets its own unbounded channel; writes never block the
//! time-management core.

use dashmap::DashMap;
use log::{trace, warn};
use rti_core::{Callback, FederateHandle};
use rti_ports::CallbackSink;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Callback sink fanning out to one mpsc channel per federate
pub struct ChannelCallbackSink<T> {
    senders: DashMap<FederateHandle, UnboundedSender<Callback<T>>>,
}

impl<T> ChannelCallbackSink<T> {
    pub fn new() -> Self {
        Self {
            senders: DashMap::new(),
        }
    }

    /// Open the callback channel of a federate, replacing any previous one
    pub fn register(&self, federate: FederateHandle) -> UnboundedReceiver<Callback<T>> {
        let (tx, rx) = unbounded_channel();
        self.senders.insert(federate, tx);
        rx
    }

    pub fn unregister(&self, federate: FederateHandle) {
        self.senders.remove(&federate);
    }

    pub fn is_registered(&self, federate: FederateHandle) -> bool {
        self.senders.contains_key(&federate)
    }
}

impl<T> Default for ChannelCallbackSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> CallbackSink<T> for ChannelCallbackSink<T> {
    fn write(&self, federate: FederateHandle, callback: Callback<T>) {
        let Some(tx) = self.senders.get(&federate) else {
            trace!("{}: no callback channel, dropping {}", federate, callback.name());
            return;
        };

        if let Err(e) = tx.send(callback) {
            warn!(
                "{}: callback channel closed, dropping {}",
                federate,
                e.0.name()
            );
        }
    }
}
