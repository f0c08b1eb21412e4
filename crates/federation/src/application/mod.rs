//! Application layer
//!
//! The federation-wide coordinator and the locked facade callers use.

pub mod coordinator;
pub mod federation;

pub use coordinator::FederationTimeCoordinator;
pub use federation::Federation;
