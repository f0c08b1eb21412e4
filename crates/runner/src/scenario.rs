//! Scenario files
//!
//! A scenario names the federates of one federation and lists the operations
//! they perform, in order:
//!
//! ```json
//! {
//!   "federation": { "name": "Demo", "time_representation": "integer64" },
//!   "federates": [{ "name": "A" }, { "name": "B" }],
//!   "steps": [
//!     { "op": "enable_time_regulation", "federate": "A", "lookahead": 10 },
//!     { "op": "enable_time_constrained", "federate": "B" },
//!     { "op": "time_advance_request", "federate": "B", "time": 5 }
//!   ]
//! }
//! ```
//!
//! Steps are decoded only once the time representation is known, so the same
//! file format serves integer and floating point federations.

use rti_core::{AttributeHandle, InteractionClassHandle, MessagePayload, ObjectInstanceHandle};
use rti_federation::FederationConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Scenario as read from disk, steps still undecoded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioFile {
    #[serde(default)]
    pub federation: FederationConfig,

    pub federates: Vec<FederateConfig>,

    #[serde(default)]
    pub steps: Vec<serde_json::Value>,
}

impl ScenarioFile {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decode the steps with the federation's time and interval types
    pub fn steps<T, I>(&self) -> Result<Vec<ScenarioStep<T, I>>>
    where
        T: for<'de> Deserialize<'de>,
        I: for<'de> Deserialize<'de>,
    {
        self.steps
            .iter()
            .map(|step| Ok(serde_json::from_value(step.clone())?))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FederateConfig {
    pub name: String,

    /// Receive every message, untrimmed; otherwise only what the
    /// subscribe steps ask for
    #[serde(default = "default_subscribe_all")]
    pub subscribe_all: bool,
}

fn default_subscribe_all() -> bool {
    true
}

/// One scripted operation
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioStep<T, I> {
    #[serde(flatten)]
    pub action: Action<T, I>,

    /// The operation must be rejected
    #[serde(default)]
    pub expect_error: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(
    tag = "op",
    rename_all = "snake_case",
    bound(deserialize = "T: Deserialize<'de>, I: Deserialize<'de>")
)]
pub enum Action<T, I> {
    EnableTimeRegulation {
        federate: String,
        lookahead: I,
    },
    DisableTimeRegulation {
        federate: String,
    },
    ModifyLookahead {
        federate: String,
        lookahead: I,
    },
    EnableTimeConstrained {
        federate: String,
    },
    DisableTimeConstrained {
        federate: String,
    },
    TimeAdvanceRequest {
        federate: String,
        time: T,
    },
    TimeAdvanceRequestAvailable {
        federate: String,
        time: T,
    },
    NextMessageRequest {
        federate: String,
        time: T,
    },
    NextMessageRequestAvailable {
        federate: String,
        time: T,
    },
    FlushQueueRequest {
        federate: String,
        time: T,
    },
    SubscribeInteractionClass {
        federate: String,
        interaction_class: InteractionClassHandle,
    },
    SubscribeObjectAttributes {
        federate: String,
        object_instance: ObjectInstanceHandle,
        attributes: Vec<AttributeHandle>,
    },
    /// Send a message; with a time it is sent timestamp order and may be
    /// given a tag to retract it by later
    Send {
        federate: String,
        #[serde(default)]
        time: Option<T>,
        #[serde(default)]
        tag: Option<String>,
        payload: MessagePayload,
    },
    Retract {
        federate: String,
        tag: String,
    },
    Resign {
        federate: String,
    },
}

impl<T, I> Action<T, I> {
    pub fn op(&self) -> &'static str {
        match self {
            Action::EnableTimeRegulation { .. } => "enable_time_regulation",
            Action::DisableTimeRegulation { .. } => "disable_time_regulation",
            Action::ModifyLookahead { .. } => "modify_lookahead",
            Action::EnableTimeConstrained { .. } => "enable_time_constrained",
            Action::DisableTimeConstrained { .. } => "disable_time_constrained",
            Action::TimeAdvanceRequest { .. } => "time_advance_request",
            Action::TimeAdvanceRequestAvailable { .. } => "time_advance_request_available",
            Action::NextMessageRequest { .. } => "next_message_request",
            Action::NextMessageRequestAvailable { .. } => "next_message_request_available",
            Action::FlushQueueRequest { .. } => "flush_queue_request",
            Action::SubscribeInteractionClass { .. } => "subscribe_interaction_class",
            Action::SubscribeObjectAttributes { .. } => "subscribe_object_attributes",
            Action::Send { .. } => "send",
            Action::Retract { .. } => "retract",
            Action::Resign { .. } => "resign",
        }
    }

    pub fn federate(&self) -> &str {
        match self {
            Action::EnableTimeRegulation { federate, .. }
            | Action::DisableTimeRegulation { federate }
            | Action::ModifyLookahead { federate, .. }
            | Action::EnableTimeConstrained { federate }
            | Action::DisableTimeConstrained { federate }
            | Action::TimeAdvanceRequest { federate, .. }
            | Action::TimeAdvanceRequestAvailable { federate, .. }
            | Action::NextMessageRequest { federate, .. }
            | Action::NextMessageRequestAvailable { federate, .. }
            | Action::FlushQueueRequest { federate, .. }
            | Action::SubscribeInteractionClass { federate, .. }
            | Action::SubscribeObjectAttributes { federate, .. }
            | Action::Send { federate, .. }
            | Action::Retract { federate, .. }
            | Action::Resign { federate } => federate,
        }
    }
}
