//! What a scenario run produced

use rti_core::{Callback, FederateHandle};
use rti_federation::domain::FederateTimeStatus;
use rti_ports::LogicalTime;
use rti_time::{Float64Time, Integer64Time};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: usize,
    pub op: &'static str,
    pub federate: String,
    /// Error the federation answered with, if any
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(bound = "T: Serialize, T::Interval: Serialize")]
pub struct FederateReport<T: LogicalTime> {
    pub name: String,
    pub handle: FederateHandle,
    /// Every callback the federate received, in order
    pub callbacks: Vec<Callback<T>>,
    /// Final time state; None once resigned
    pub status: Option<FederateTimeStatus<T>>,
}

impl<T: LogicalTime> FederateReport<T> {
    /// Times of every TimeAdvanceGrant received
    pub fn grants(&self) -> Vec<T> {
        self.callbacks
            .iter()
            .filter_map(|callback| match callback {
                Callback::TimeAdvanceGrant { time } => Some(*time),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(bound = "T: Serialize, T::Interval: Serialize")]
pub struct ScenarioReport<T: LogicalTime> {
    pub federation: String,
    pub time_representation: &'static str,
    pub galt: Option<T>,
    pub steps: Vec<StepOutcome>,
    pub federates: Vec<FederateReport<T>>,
}

impl<T: LogicalTime> ScenarioReport<T> {
    pub fn federate(&self, name: &str) -> Option<&FederateReport<T>> {
        self.federates.iter().find(|federate| federate.name == name)
    }
}

/// Report of a run, in the federation's time representation
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ScenarioOutcome {
    Integer64(ScenarioReport<Integer64Time>),
    Float64(ScenarioReport<Float64Time>),
}

impl ScenarioOutcome {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
