//! Scenario execution against an in-memory federation
//!
//! Each federate gets its own callback channel drained by a collector task;
//! steps run one after another through the federation facade.

use log::{debug, info};
use rti_core::{Callback, FederateHandle, Message, MessageRetractionHandle};
use rti_federation::{
    ChannelCallbackSink, Federation, FederationError, InMemorySubscriptions, TimeRepresentation,
};
use rti_ports::LogicalTime;
use rti_time::{Float64Time, Integer64Time};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::error::{Result, RunnerError};
use crate::report::{FederateReport, ScenarioOutcome, ScenarioReport, StepOutcome};
use crate::scenario::{Action, ScenarioFile};

pub struct ScenarioRunner {
    scenario: ScenarioFile,
}

impl ScenarioRunner {
    pub fn new(scenario: ScenarioFile) -> Self {
        Self { scenario }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(ScenarioFile::from_file(path)?))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(ScenarioFile::from_json(json)?))
    }

    pub fn scenario(&self) -> &ScenarioFile {
        &self.scenario
    }

    /// Run every step and report what each federate saw
    pub async fn run(&self) -> Result<ScenarioOutcome> {
        match self.scenario.federation.time_representation {
            TimeRepresentation::Integer64 => {
                Ok(ScenarioOutcome::Integer64(self.run_with::<Integer64Time>().await?))
            }
            TimeRepresentation::Float64 => {
                Ok(ScenarioOutcome::Float64(self.run_with::<Float64Time>().await?))
            }
        }
    }

    async fn run_with<T>(&self) -> Result<ScenarioReport<T>>
    where
        T: LogicalTime + DeserializeOwned,
        T::Interval: DeserializeOwned,
    {
        let steps = self.scenario.steps::<T, T::Interval>()?;

        let sink: Arc<ChannelCallbackSink<T>> = Arc::new(ChannelCallbackSink::new());
        let subscriptions: Arc<InMemorySubscriptions<T>> =
            Arc::new(InMemorySubscriptions::new(sink.clone()));
        let federation: Federation<T> = Federation::new(
            &self.scenario.federation,
            subscriptions.clone(),
            sink.clone(),
        )?;

        info!(
            "Running scenario on {} with {} federates and {} steps",
            federation.name(),
            self.scenario.federates.len(),
            steps.len()
        );

        let mut handles = BTreeMap::new();
        let mut joined: Vec<(String, FederateHandle, JoinHandle<Vec<Callback<T>>>)> = Vec::new();
        for config in &self.scenario.federates {
            if handles.contains_key(&config.name) {
                return Err(RunnerError::DuplicateFederate(config.name.clone()));
            }

            let handle = federation.join();
            let mut rx = sink.register(handle);
            if config.subscribe_all {
                subscriptions.subscribe_all(handle);
            }

            let collector = tokio::spawn(async move {
                let mut callbacks = Vec::new();
                while let Some(callback) = rx.recv().await {
                    callbacks.push(callback);
                }
                callbacks
            });

            debug!("{} joined as {}", config.name, handle);
            handles.insert(config.name.clone(), handle);
            joined.push((config.name.clone(), handle, collector));
        }

        let mut session = Session {
            federation: &federation,
            subscriptions: subscriptions.as_ref(),
            handles: &handles,
            retractions: HashMap::new(),
            serials: HashMap::new(),
        };

        let mut outcomes = Vec::with_capacity(steps.len());
        for (index, step) in steps.into_iter().enumerate() {
            let number = index + 1;
            let op = step.action.op();
            let federate = step.action.federate().to_string();

            let error = match (session.apply(step.action)?, step.expect_error) {
                (Ok(()), false) => None,
                (Ok(()), true) => return Err(RunnerError::UnexpectedSuccess { step: number, op }),
                (Err(e), true) => {
                    debug!("step {} ({}) rejected as expected: {}", number, op, e);
                    Some(e.to_string())
                }
                (Err(source), false) => {
                    return Err(RunnerError::Step {
                        step: number,
                        op,
                        source,
                    });
                }
            };

            outcomes.push(StepOutcome {
                step: number,
                op,
                federate,
                error,
            });
        }

        let galt = federation.galt();
        let statuses: Vec<_> = joined
            .iter()
            .map(|(_, handle, _)| federation.status(*handle).ok())
            .collect();

        // closing the channels ends the collectors
        for (_, handle, _) in &joined {
            sink.unregister(*handle);
        }

        let mut federates = Vec::with_capacity(joined.len());
        for ((name, handle, collector), status) in joined.into_iter().zip(statuses) {
            let callbacks = collector
                .await
                .map_err(|e| RunnerError::Collector(e.to_string()))?;
            federates.push(FederateReport {
                name,
                handle,
                callbacks,
                status,
            });
        }

        info!("Scenario finished (galt={:?})", galt);

        Ok(ScenarioReport {
            federation: federation.name().to_string(),
            time_representation: T::representation(),
            galt,
            steps: outcomes,
            federates,
        })
    }
}

/// Per-run state: federate names and retraction tags
struct Session<'a, T: LogicalTime> {
    federation: &'a Federation<T>,
    subscriptions: &'a InMemorySubscriptions<T>,
    handles: &'a BTreeMap<String, FederateHandle>,
    retractions: HashMap<String, MessageRetractionHandle>,
    serials: HashMap<FederateHandle, u64>,
}

impl<T: LogicalTime> Session<'_, T> {
    fn handle(&self, name: &str) -> Result<FederateHandle> {
        self.handles
            .get(name)
            .copied()
            .ok_or_else(|| RunnerError::UnknownFederate(name.to_string()))
    }

    fn next_retraction(&mut self, federate: FederateHandle) -> MessageRetractionHandle {
        let serial = self.serials.entry(federate).or_insert(0);
        *serial += 1;
        MessageRetractionHandle::new(federate, *serial)
    }

    /// Apply one action; the outer error is a broken script, the inner one
    /// the federation's answer
    fn apply(
        &mut self,
        action: Action<T, T::Interval>,
    ) -> Result<std::result::Result<(), FederationError>> {
        let federate = self.handle(action.federate())?;
        let federation = self.federation;

        Ok(match action {
            Action::EnableTimeRegulation { lookahead, .. } => {
                federation.enable_time_regulation(federate, lookahead)
            }
            Action::DisableTimeRegulation { .. } => federation.disable_time_regulation(federate),
            Action::ModifyLookahead { lookahead, .. } => {
                federation.modify_lookahead(federate, lookahead)
            }
            Action::EnableTimeConstrained { .. } => federation.enable_time_constrained(federate),
            Action::DisableTimeConstrained { .. } => federation.disable_time_constrained(federate),
            Action::TimeAdvanceRequest { time, .. } => {
                federation.time_advance_request(federate, time)
            }
            Action::TimeAdvanceRequestAvailable { time, .. } => {
                federation.time_advance_request_available(federate, time)
            }
            Action::NextMessageRequest { time, .. } => {
                federation.next_message_request(federate, time)
            }
            Action::NextMessageRequestAvailable { time, .. } => {
                federation.next_message_request_available(federate, time)
            }
            Action::FlushQueueRequest { time, .. } => {
                federation.flush_queue_request(federate, time)
            }
            Action::SubscribeInteractionClass {
                interaction_class, ..
            } => {
                self.subscriptions
                    .subscribe_interaction_class(federate, interaction_class);
                Ok(())
            }
            Action::SubscribeObjectAttributes {
                object_instance,
                attributes,
                ..
            } => {
                self.subscriptions
                    .subscribe_object_attributes(federate, object_instance, attributes);
                Ok(())
            }
            Action::Send {
                time, tag, payload, ..
            } => {
                let message = match time {
                    Some(time) => {
                        let retraction = self.next_retraction(federate);
                        if let Some(tag) = tag {
                            self.retractions.insert(tag, retraction);
                        }
                        Message::timestamp_order(federate, time, retraction, payload)
                    }
                    None => Message::receive_order(federate, payload),
                };
                federation.send(message)
            }
            Action::Retract { tag, .. } => {
                let retraction = self
                    .retractions
                    .get(&tag)
                    .copied()
                    .ok_or(RunnerError::UnknownRetraction(tag))?;
                federation.retract(federate, retraction)
            }
            Action::Resign { .. } => {
                let result = federation.resign(federate);
                if result.is_ok() {
                    self.subscriptions.remove_federate(federate);
                }
                result
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_federate_fails_run() {
        let runner = ScenarioRunner::from_json(
            r#"{"federates": [{"name": "A"}],
                "steps": [{"op": "enable_time_constrained", "federate": "Z"}]}"#,
        )
        .unwrap();

        assert!(matches!(
            runner.run().await,
            Err(RunnerError::UnknownFederate(name)) if name == "Z"
        ));
    }

    #[tokio::test]
    async fn test_duplicate_federate_names_rejected() {
        let runner =
            ScenarioRunner::from_json(r#"{"federates": [{"name": "A"}, {"name": "A"}]}"#).unwrap();

        assert!(matches!(
            runner.run().await,
            Err(RunnerError::DuplicateFederate(_))
        ));
    }

    #[tokio::test]
    async fn test_expected_error_recorded() {
        let runner = ScenarioRunner::from_json(
            r#"{"federates": [{"name": "A"}],
                "steps": [{"op": "disable_time_regulation", "federate": "A", "expect_error": true}]}"#,
        )
        .unwrap();

        let ScenarioOutcome::Integer64(report) = runner.run().await.unwrap() else {
            panic!("expected an integer report");
        };
        assert!(report.steps[0].error.is_some());
        assert_eq!(report.galt, None::<Integer64Time>);
    }

    #[tokio::test]
    async fn test_unexpected_success_fails_run() {
        let runner = ScenarioRunner::from_json(
            r#"{"federates": [{"name": "A"}],
                "steps": [{"op": "enable_time_constrained", "federate": "A", "expect_error": true}]}"#,
        )
        .unwrap();

        assert!(matches!(
            runner.run().await,
            Err(RunnerError::UnexpectedSuccess { step: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_rejected_step_fails_run() {
        let runner = ScenarioRunner::from_json(
            r#"{"federates": [{"name": "A"}],
                "steps": [{"op": "modify_lookahead", "federate": "A", "lookahead": 1}]}"#,
        )
        .unwrap();

        assert!(matches!(
            runner.run().await,
            Err(RunnerError::Step {
                source: FederationError::TimeRegulationNotEnabled(_),
                ..
            })
        ));
    }
}
