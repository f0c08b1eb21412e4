use serde::{Deserialize, Serialize};

/// Delivery ordering of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Delivered as soon as it arrives, in arrival order
    Receive,
    /// Held until logical time allows it, delivered in timestamp order
    Timestamp,
}
