//! Infrastructure layer
//!
//! In-memory adapters for the delivery and callback ports, and configuration.

pub mod channel;
pub mod config;
pub mod subscriptions;

pub use channel::ChannelCallbackSink;
pub use config::{ConfigError, FederationConfig, TimeRepresentation};
pub use subscriptions::InMemorySubscriptions;
