use log::{debug, info, warn};
use rti_core::{FederateHandle, Message, MessageRetractionHandle, SentOrder, TimeAdvanceType};
use rti_ports::{CallbackSink, LogicalTime, LogicalTimeInterval, MessageDelivery};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::domain::{
    AdvanceRequest, Collaborators, FederateTimeState, FederateTimeStatus, Receipt, RetractOutcome,
};
use crate::error::{FederationError, Result};

/// Shared collaborators, lent to federate records per operation
struct Services<T> {
    delivery: Arc<dyn MessageDelivery<T>>,
    callbacks: Arc<dyn CallbackSink<T>>,
}

impl<T> Services<T> {
    fn ctx(&self) -> Collaborators<'_, T> {
        Collaborators {
            delivery: self.delivery.as_ref(),
            callbacks: self.callbacks.as_ref(),
        }
    }
}

fn joined<T: LogicalTime>(
    federates: &mut BTreeMap<FederateHandle, FederateTimeState<T>>,
    federate: FederateHandle,
) -> Result<&mut FederateTimeState<T>> {
    federates
        .get_mut(&federate)
        .ok_or(FederationError::FederateNotJoined(federate))
}

/// Federation-wide time management
///
/// Owns every joined federate's time state, the set of regulating federates
/// and GALT. All operations take `&mut self`; callers reach them through the
/// federation's write guard, so one operation completes before the next
/// starts.
pub struct FederationTimeCoordinator<T: LogicalTime> {
    federates: BTreeMap<FederateHandle, FederateTimeState<T>>,
    regulating: BTreeSet<FederateHandle>,

    /// Greatest available logical time; None while nobody regulates
    galt: Option<T>,

    services: Services<T>,
    next_federate: u32,
}

impl<T: LogicalTime> FederationTimeCoordinator<T> {
    pub fn new(
        delivery: Arc<dyn MessageDelivery<T>>,
        callbacks: Arc<dyn CallbackSink<T>>,
    ) -> Self {
        Self {
            federates: BTreeMap::new(),
            regulating: BTreeSet::new(),
            galt: None,
            services: Services {
                delivery,
                callbacks,
            },
            next_federate: 1,
        }
    }

    pub fn galt(&self) -> Option<T> {
        self.galt
    }

    pub fn federates(&self) -> Vec<FederateHandle> {
        self.federates.keys().copied().collect()
    }

    pub fn is_joined(&self, federate: FederateHandle) -> bool {
        self.federates.contains_key(&federate)
    }

    pub fn regulating(&self) -> Vec<FederateHandle> {
        self.regulating.iter().copied().collect()
    }

    pub fn constrained(&self) -> Vec<FederateHandle> {
        self.federates
            .values()
            .filter(|state| state.is_time_constrained_enabled())
            .map(|state| state.handle())
            .collect()
    }

    pub fn status(&self, federate: FederateHandle) -> Result<FederateTimeStatus<T>> {
        self.federates
            .get(&federate)
            .map(|state| state.status(self.services.ctx()))
            .ok_or(FederationError::FederateNotJoined(federate))
    }

    pub fn join(&mut self) -> FederateHandle {
        let handle = FederateHandle(self.next_federate);
        self.next_federate += 1;

        self.federates
            .insert(handle, FederateTimeState::new(handle, self.galt));

        info!("{} joined (galt={:?})", handle, self.galt);
        handle
    }

    /// Remove a federate; its queue is discarded and, if it was regulating,
    /// GALT is recomputed without it
    pub fn resign(&mut self, federate: FederateHandle) -> Result<()> {
        let mut state = self
            .federates
            .remove(&federate)
            .ok_or(FederationError::FederateNotJoined(federate))?;
        state.discard();

        info!("{} resigned", federate);

        if self.regulating.remove(&federate) {
            self.update_galt();
        }
        Ok(())
    }

    pub fn enable_time_regulation(
        &mut self,
        federate: FederateHandle,
        lookahead: T::Interval,
    ) -> Result<()> {
        let time = {
            let state = joined(&mut self.federates, federate)?;
            if state.is_time_regulation_enabled() {
                return Err(FederationError::TimeRegulationAlreadyEnabled(federate));
            }
            if !state.advance_request().is_idle() {
                return Err(FederationError::InTimeAdvancingState(federate));
            }
            state.federate_time()
        };

        let time = self.regulation_start_time(federate, time, lookahead)?;

        let ctx = self.services.ctx();
        joined(&mut self.federates, federate)?.enable_time_regulation(lookahead, time, ctx)?;
        self.regulating.insert(federate);

        self.update_galt();
        Ok(())
    }

    /// Time a federate becomes regulating at: its own time, moved forward so
    /// its first LOTS undercuts neither GALT nor what constrained federates
    /// have already been granted
    fn regulation_start_time(
        &self,
        federate: FederateHandle,
        time: T,
        lookahead: T::Interval,
    ) -> Result<T> {
        // least LOTS the new regulator may have
        let floor = match self.galt {
            Some(galt) => Some(galt),
            None => {
                let mut max_constrained: Option<T> = None;
                for state in self.federates.values() {
                    if state.handle() == federate || !state.is_time_constrained_enabled() {
                        continue;
                    }
                    let granted = match state.last_advance() {
                        TimeAdvanceType::None
                        | TimeAdvanceType::TimeAdvanceRequest
                        | TimeAdvanceType::NextMessageRequest => {
                            state.federate_time().add(T::Interval::epsilon())?
                        }
                        _ => state.federate_time(),
                    };
                    max_constrained = max_constrained.max(Some(granted));
                }
                max_constrained
            }
        };

        match floor {
            Some(floor) if time.add(lookahead)? < floor => Ok(floor.subtract(lookahead)?),
            _ => Ok(time),
        }
    }

    pub fn disable_time_regulation(&mut self, federate: FederateHandle) -> Result<()> {
        let state = joined(&mut self.federates, federate)?;
        if !state.is_time_regulation_enabled() {
            return Err(FederationError::TimeRegulationNotEnabled(federate));
        }
        state.disable_time_regulation();
        self.regulating.remove(&federate);

        self.update_galt();
        Ok(())
    }

    pub fn modify_lookahead(
        &mut self,
        federate: FederateHandle,
        lookahead: T::Interval,
    ) -> Result<()> {
        let ctx = self.services.ctx();
        let state = joined(&mut self.federates, federate)?;
        if !state.is_time_regulation_enabled() {
            return Err(FederationError::TimeRegulationNotEnabled(federate));
        }
        if !state.advance_request().is_idle() {
            return Err(FederationError::InTimeAdvancingState(federate));
        }

        if state.modify_lookahead(lookahead, ctx)? {
            self.update_galt();
        }
        Ok(())
    }

    pub fn enable_time_constrained(&mut self, federate: FederateHandle) -> Result<()> {
        let ctx = self.services.ctx();
        let state = joined(&mut self.federates, federate)?;
        if state.is_time_constrained_enabled() {
            return Err(FederationError::TimeConstrainedAlreadyEnabled(federate));
        }
        if state.is_time_constrained_pending() {
            return Err(FederationError::RequestForTimeConstrainedPending(federate));
        }
        if !state.advance_request().is_idle() {
            return Err(FederationError::InTimeAdvancingState(federate));
        }

        state.enable_time_constrained(ctx);
        Ok(())
    }

    /// Stop being constrained; anything still queued is delivered in receive
    /// order. A pending enable is cancelled.
    pub fn disable_time_constrained(&mut self, federate: FederateHandle) -> Result<()> {
        let ctx = self.services.ctx();
        let state = joined(&mut self.federates, federate)?;
        if !state.is_time_constrained_enabled() && !state.is_time_constrained_pending() {
            return Err(FederationError::TimeConstrainedNotEnabled(federate));
        }

        let regulating = state.is_time_regulation_enabled();
        if state.disable_time_constrained(ctx).is_some() && regulating {
            self.update_galt();
        }
        Ok(())
    }

    pub fn time_advance_request(&mut self, federate: FederateHandle, time: T) -> Result<()> {
        self.request_advance(federate, AdvanceRequest::TimeAdvance(time))
    }

    pub fn time_advance_request_available(
        &mut self,
        federate: FederateHandle,
        time: T,
    ) -> Result<()> {
        self.request_advance(federate, AdvanceRequest::TimeAdvanceAvailable(time))
    }

    pub fn next_message_request(&mut self, federate: FederateHandle, time: T) -> Result<()> {
        self.request_advance(federate, AdvanceRequest::NextMessage(time))
    }

    pub fn next_message_request_available(
        &mut self,
        federate: FederateHandle,
        time: T,
    ) -> Result<()> {
        self.request_advance(federate, AdvanceRequest::NextMessageAvailable(time))
    }

    pub fn flush_queue_request(&mut self, federate: FederateHandle, time: T) -> Result<()> {
        self.request_advance(federate, AdvanceRequest::FlushQueue(time))
    }

    fn request_advance(
        &mut self,
        federate: FederateHandle,
        request: AdvanceRequest<T>,
    ) -> Result<()> {
        let ctx = self.services.ctx();
        let state = joined(&mut self.federates, federate)?;
        if !state.advance_request().is_idle() {
            return Err(FederationError::InTimeAdvancingState(federate));
        }
        if state.is_time_constrained_pending() {
            return Err(FederationError::RequestForTimeConstrainedPending(federate));
        }
        if let Some(time) = request.time() {
            if time < state.federate_time() {
                return Err(FederationError::LogicalTimeAlreadyPassed(format!(
                    "{} requested {} but is at {}",
                    federate,
                    time,
                    state.federate_time()
                )));
            }
        }

        let regulating = state.is_time_regulation_enabled();
        if let Some(granted) = state.request_advance(request, ctx)? {
            debug!("{} granted {} immediately", federate, granted);
        }

        if regulating {
            self.update_galt();
        }
        Ok(())
    }

    /// Route a message from its producer to every other joined federate
    ///
    /// A timestamped message from a regulating federate must not be earlier
    /// than the sender's LOTS; from a non-regulating one it is downgraded to
    /// receive order.
    pub fn send(&mut self, message: Message<T>) -> Result<()> {
        let producer = message.producer;
        let ctx = self.services.ctx();

        let sender = self
            .federates
            .get(&producer)
            .ok_or(FederationError::FederateNotJoined(producer))?;

        let message = match message.sent_order {
            SentOrder::Timestamp { time, retraction } => {
                if retraction.federate != producer {
                    return Err(FederationError::InvalidRetractionHandle(format!(
                        "{} does not belong to {}",
                        retraction, producer
                    )));
                }
                match sender.lots() {
                    Some(lots) if time < lots => {
                        return Err(FederationError::InvalidLogicalTime(format!(
                            "{} sent at {} which is less than its LOTS {}",
                            producer, time, lots
                        )));
                    }
                    Some(_) => message,
                    None => message.into_receive_order(),
                }
            }
            SentOrder::Receive => message,
        };

        let mut lots_changed = false;
        let mut receivers = 0;
        for state in self.federates.values_mut() {
            if state.handle() == producer {
                continue;
            }
            match state.receive(message.clone(), ctx) {
                Receipt::Queued { lots_changed: changed } => {
                    lots_changed |= changed;
                    receivers += 1;
                }
                Receipt::Delivered => receivers += 1,
                Receipt::Dropped => {}
            }
        }

        debug!(
            "{} sent {:?} message to {} federates",
            producer,
            message.order_type(),
            receivers
        );

        if lots_changed {
            self.update_galt();
        }
        Ok(())
    }

    /// Retract a previously sent timestamped message everywhere
    pub fn retract(
        &mut self,
        federate: FederateHandle,
        retraction: MessageRetractionHandle,
    ) -> Result<()> {
        if !self.federates.contains_key(&federate) {
            return Err(FederationError::FederateNotJoined(federate));
        }
        if retraction.federate != federate {
            return Err(FederationError::InvalidRetractionHandle(format!(
                "{} does not belong to {}",
                retraction, federate
            )));
        }

        let ctx = self.services.ctx();
        let mut lots_changed = false;
        let mut reached = 0;
        for state in self.federates.values_mut() {
            if state.handle() == federate {
                continue;
            }
            match state.retract(retraction, ctx) {
                RetractOutcome::Cancelled { lots_changed: changed } => {
                    lots_changed |= changed;
                    reached += 1;
                }
                RetractOutcome::Forwarded => reached += 1,
                RetractOutcome::Unknown => {}
            }
        }

        debug!("{} retracted {} at {} federates", federate, retraction, reached);

        if lots_changed {
            self.update_galt();
        }
        Ok(())
    }

    fn compute_galt(&self) -> Option<T> {
        self.regulating
            .iter()
            .filter_map(|handle| self.federates.get(handle))
            .filter_map(|state| state.lots())
            .min()
    }

    /// Recompute GALT and push it to every federate whose copy is behind
    ///
    /// GALT only moves forward. Grants triggered by an advance may move LOTS
    /// again, so this repeats until GALT settles.
    fn update_galt(&mut self) {
        if self.regulating.is_empty() {
            if self.galt.take().is_some() {
                info!("GALT undefined");

                let ctx = self.services.ctx();
                for state in self.federates.values_mut() {
                    state.galt_undefined(ctx);
                }
            }
            return;
        }

        for _ in 0..=self.federates.len() {
            let Some(galt) = self.compute_galt() else {
                return;
            };

            match self.galt {
                Some(current) if galt <= current => {
                    if galt < current {
                        debug!("GALT {} held, computed {}", current, galt);
                    }
                    return;
                }
                Some(current) => debug!("GALT {} -> {}", current, galt),
                None => info!("GALT defined at {}", galt),
            }
            self.galt = Some(galt);

            let ctx = self.services.ctx();
            for state in self.federates.values_mut() {
                if state.galt().is_none_or(|behind| behind < galt) {
                    state.galt_advanced(galt, ctx);
                }
            }
        }

        warn!("GALT still moving after a full propagation round");
    }
}
