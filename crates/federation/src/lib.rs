//! Federation time management
//!
//! Computes GALT over the time-regulating federates, grants time advances
//! to time-constrained ones and delivers timestamp-order messages in order.
//!
//! ## Layers
//!
//! - **domain**: per-federate state machine, TSO queue, delivered-message registry
//! - **application**: `FederationTimeCoordinator` and the locked `Federation` facade
//! - **infrastructure**: channel callback sink, in-memory subscriptions, configuration

// Domain layer
pub mod domain;

// Application layer
pub mod application;

// Infrastructure layer
pub mod infrastructure;

// Cross-cutting concerns
pub mod error;
pub mod model;

// Re-export main types for convenience
pub use application::{Federation, FederationTimeCoordinator};
pub use error::{FederationError, Result};
pub use infrastructure::{
    ChannelCallbackSink, ConfigError, FederationConfig, InMemorySubscriptions, TimeRepresentation,
};
