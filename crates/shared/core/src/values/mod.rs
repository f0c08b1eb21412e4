use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of a joined federate, unique within one federation execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FederateHandle(pub u32);

impl fmt::Display for FederateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "federate-{}", self.0)
    }
}

/// Identifies a timestamp-ordered message so it can be retracted later.
///
/// Handles are minted by the sending federate; the serial only has to be
/// unique per sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageRetractionHandle {
    pub federate: FederateHandle,
    pub serial: u64,
}

impl MessageRetractionHandle {
    pub fn new(federate: FederateHandle, serial: u64) -> Self {
        Self { federate, serial }
    }
}

impl fmt::Display for MessageRetractionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.federate, self.serial)
    }
}

/// Interaction class as declared by the federation object model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InteractionClassHandle(pub u32);

/// Parameter of an interaction class
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterHandle(pub u32);

/// Registered object instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectInstanceHandle(pub u64);

/// Attribute of an object class
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeHandle(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retraction_handle_display() {
        let handle = MessageRetractionHandle::new(FederateHandle(3), 17);
        assert_eq!(handle.to_string(), "federate-3#17");
    }

    #[test]
    fn test_retraction_handles_order_by_sender_then_serial() {
        let a = MessageRetractionHandle::new(FederateHandle(1), 9);
        let b = MessageRetractionHandle::new(FederateHandle(2), 0);
        let c = MessageRetractionHandle::new(FederateHandle(2), 1);
        assert!(a < b);
        assert!(b < c);
    }
}
