use log::{debug, error, info, trace};
use rti_core::{
    Callback, FederateHandle, Message, MessageRetractionHandle, OrderType, SentOrder,
    TimeAdvanceType,
};
use rti_ports::{CallbackSink, LogicalTime, LogicalTimeInterval, MessageDelivery, TimeResult};
use serde::Serialize;

use super::retractable::RetractableRegistry;
use super::tso_queue::{QueuedMessage, TimeStampOrderedQueue};

/// Outstanding (not yet granted) time advance of one federate
///
/// At most one is outstanding at a time; `Idle` means none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", content = "time", rename_all = "snake_case")]
pub enum AdvanceRequest<T> {
    #[default]
    Idle,
    TimeAdvance(T),
    TimeAdvanceAvailable(T),
    NextMessage(T),
    NextMessageAvailable(T),
    FlushQueue(T),
}

impl<T: Copy> AdvanceRequest<T> {
    pub fn kind(&self) -> TimeAdvanceType {
        match self {
            AdvanceRequest::Idle => TimeAdvanceType::None,
            AdvanceRequest::TimeAdvance(_) => TimeAdvanceType::TimeAdvanceRequest,
            AdvanceRequest::TimeAdvanceAvailable(_) => TimeAdvanceType::TimeAdvanceRequestAvailable,
            AdvanceRequest::NextMessage(_) => TimeAdvanceType::NextMessageRequest,
            AdvanceRequest::NextMessageAvailable(_) => TimeAdvanceType::NextMessageRequestAvailable,
            AdvanceRequest::FlushQueue(_) => TimeAdvanceType::FlushQueueRequest,
        }
    }

    pub fn time(&self) -> Option<T> {
        match *self {
            AdvanceRequest::Idle => None,
            AdvanceRequest::TimeAdvance(t)
            | AdvanceRequest::TimeAdvanceAvailable(t)
            | AdvanceRequest::NextMessage(t)
            | AdvanceRequest::NextMessageAvailable(t)
            | AdvanceRequest::FlushQueue(t) => Some(t),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, AdvanceRequest::Idle)
    }
}

/// The collaborators a federate's time state talks to
///
/// Borrowed from the coordinator for the duration of one locked operation.
pub struct Collaborators<'a, T> {
    pub delivery: &'a dyn MessageDelivery<T>,
    pub callbacks: &'a dyn CallbackSink<T>,
}

impl<T> Clone for Collaborators<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Collaborators<'_, T> {}

/// What happened to a message routed to one federate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receipt {
    /// Held in the TSO queue; `lots_changed` is set when a parked next
    /// message request of a regulating federate lowered its LOTS
    Queued { lots_changed: bool },
    Delivered,
    /// Filtered out, or a duplicate of something already delivered
    Dropped,
}

/// What a retraction did at one federate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetractOutcome {
    Cancelled { lots_changed: bool },
    /// Already delivered; a retract notice was forwarded
    Forwarded,
    Unknown,
}

/// Read-only snapshot of a federate's time state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound = "T: Serialize, T::Interval: Serialize")]
pub struct FederateTimeStatus<T: LogicalTime> {
    pub federate: FederateHandle,
    pub federate_time: T,
    pub galt: Option<T>,
    pub lots: Option<T>,
    pub lits: Option<T>,
    pub lookahead: Option<T::Interval>,
    pub time_regulation_enabled: bool,
    pub time_constrained_enabled: bool,
    pub time_constrained_pending: bool,
    pub advance_request: AdvanceRequest<T>,
    pub queued_messages: usize,
}

/// Time attributes and advance-request state machine of one joined federate
pub struct FederateTimeState<T: LogicalTime> {
    handle: FederateHandle,

    /// Current granted logical time
    federate_time: T,

    /// Present iff time-regulating
    lookahead: Option<T::Interval>,
    lots: Option<T>,
    /// LOTS already promised before a lookahead reduction; computed LOTS may
    /// not drop below it until time catches up
    lots_floor: Option<T>,

    time_constrained_enabled: bool,
    time_constrained_pending: bool,

    advance: AdvanceRequest<T>,
    /// Kind of the last granted request
    last_advance: TimeAdvanceType,

    /// Last GALT pushed by the coordinator
    galt: Option<T>,

    queue: TimeStampOrderedQueue<T>,
    retractables: RetractableRegistry<T>,
}

/// Lookahead to add for a request kind: TAR and NMR need strict advancement,
/// so a zero lookahead becomes epsilon; the available variants keep zero.
fn lookahead_for<I: LogicalTimeInterval>(kind: TimeAdvanceType, lookahead: I) -> I {
    match kind {
        TimeAdvanceType::TimeAdvanceRequest | TimeAdvanceType::NextMessageRequest
            if lookahead.is_zero() =>
        {
            I::epsilon()
        }
        _ => lookahead,
    }
}

fn earliest<T: Ord>(time: T, other: Option<T>) -> T {
    match other {
        Some(other) if other < time => other,
        _ => time,
    }
}

/// Deliver one queued message, suppressing anything already delivered
fn deliver_queued<T: LogicalTime>(
    federate: FederateHandle,
    retractables: &mut RetractableRegistry<T>,
    delivery: &dyn MessageDelivery<T>,
    entry: &QueuedMessage<T>,
    order: OrderType,
) -> bool {
    if retractables.contains(&entry.retraction) {
        trace!("{}: suppressing duplicate {}", federate, entry.retraction);
        return false;
    }
    if !delivery.deliver(federate, &entry.message, order) {
        return false;
    }
    retractables.add(entry.retraction, entry.time);
    true
}

impl<T: LogicalTime> FederateTimeState<T> {
    /// State of a newly joined federate; `galt` is the federation's current
    /// value
    pub fn new(handle: FederateHandle, galt: Option<T>) -> Self {
        Self {
            handle,
            federate_time: T::initial(),
            lookahead: None,
            lots: None,
            lots_floor: None,
            time_constrained_enabled: false,
            time_constrained_pending: false,
            advance: AdvanceRequest::Idle,
            last_advance: TimeAdvanceType::None,
            galt,
            queue: TimeStampOrderedQueue::new(),
            retractables: RetractableRegistry::new(),
        }
    }

    pub fn handle(&self) -> FederateHandle {
        self.handle
    }

    pub fn federate_time(&self) -> T {
        self.federate_time
    }

    pub fn galt(&self) -> Option<T> {
        self.galt
    }

    pub fn lots(&self) -> Option<T> {
        self.lots
    }

    pub fn lookahead(&self) -> Option<T::Interval> {
        self.lookahead
    }

    pub fn is_time_regulation_enabled(&self) -> bool {
        self.lookahead.is_some()
    }

    pub fn is_time_constrained_enabled(&self) -> bool {
        self.time_constrained_enabled
    }

    pub fn is_time_constrained_pending(&self) -> bool {
        self.time_constrained_pending
    }

    pub fn advance_request(&self) -> AdvanceRequest<T> {
        self.advance
    }

    pub fn last_advance(&self) -> TimeAdvanceType {
        self.last_advance
    }

    pub fn queued_messages(&self) -> usize {
        self.queue.len()
    }

    /// Least incoming time stamp: earliest queued message this federate
    /// would actually receive
    pub fn lits(&mut self, ctx: Collaborators<'_, T>) -> Option<T> {
        let handle = self.handle;
        let retractables = &self.retractables;
        self.queue.lits(|entry| {
            !retractables.contains(&entry.retraction)
                && ctx.delivery.would_deliver(handle, &entry.message)
        })
    }

    pub fn status(&self, ctx: Collaborators<'_, T>) -> FederateTimeStatus<T> {
        let retractables = &self.retractables;
        let lits = self.queue.peek_lits(|entry| {
            !retractables.contains(&entry.retraction)
                && ctx.delivery.would_deliver(self.handle, &entry.message)
        });

        FederateTimeStatus {
            federate: self.handle,
            federate_time: self.federate_time,
            galt: self.galt,
            lots: self.lots,
            lits,
            lookahead: self.lookahead,
            time_regulation_enabled: self.is_time_regulation_enabled(),
            time_constrained_enabled: self.time_constrained_enabled,
            time_constrained_pending: self.time_constrained_pending,
            advance_request: self.advance,
            queued_messages: self.queue.len(),
        }
    }

    /// Become time-regulating at `time` (which the coordinator may have moved
    /// ahead of the current federate time)
    pub fn enable_time_regulation(
        &mut self,
        lookahead: T::Interval,
        time: T,
        ctx: Collaborators<'_, T>,
    ) -> TimeResult<()> {
        let lots = time.add(lookahead)?;

        if time > self.federate_time {
            debug!(
                "{}: federate time moved from {} to {} to enable regulation",
                self.handle, self.federate_time, time
            );
        }
        self.federate_time = time;
        self.lookahead = Some(lookahead);
        self.lots = Some(lots);
        self.lots_floor = None;

        info!(
            "{}: time regulation enabled at {} (lookahead={}, lots={})",
            self.handle, time, lookahead, lots
        );
        ctx.callbacks
            .write(self.handle, Callback::TimeRegulationEnabled { time });
        Ok(())
    }

    pub fn disable_time_regulation(&mut self) {
        self.lookahead = None;
        self.lots = None;
        self.lots_floor = None;

        info!("{}: time regulation disabled", self.handle);
    }

    /// Change the lookahead; returns whether LOTS changed
    ///
    /// A reduction never lowers LOTS below what was already promised; it
    /// takes effect as the federate advances.
    pub fn modify_lookahead(
        &mut self,
        lookahead: T::Interval,
        ctx: Collaborators<'_, T>,
    ) -> TimeResult<bool> {
        let request = self.advance;
        let computed = self.lots_for(&request, lookahead, ctx)?;

        let previous = self.lots;
        if let Some(previous) = previous {
            if computed < previous {
                self.lots_floor = Some(previous);
            }
        }

        self.lookahead = Some(lookahead);
        let lots = self.settle_lots(computed);

        debug!(
            "{}: lookahead modified to {} (lots={})",
            self.handle, lookahead, lots
        );
        Ok(previous != Some(lots))
    }

    /// Returns true if the federate became constrained immediately; false if
    /// it is ahead of GALT and the enable is pending
    pub fn enable_time_constrained(&mut self, ctx: Collaborators<'_, T>) -> bool {
        match self.galt {
            Some(galt) if self.federate_time > galt => {
                self.time_constrained_pending = true;

                debug!(
                    "{}: time constrained pending (time={} > galt={})",
                    self.handle, self.federate_time, galt
                );
                false
            }
            _ => {
                self.complete_time_constrained(ctx);
                true
            }
        }
    }

    /// Stop being constrained: queued messages go out in receive order and a
    /// parked request is granted. Returns the granted time, if any.
    pub fn disable_time_constrained(&mut self, ctx: Collaborators<'_, T>) -> Option<T> {
        self.time_constrained_enabled = false;
        self.time_constrained_pending = false;

        info!("{}: time constrained disabled", self.handle);

        self.deliver_all(OrderType::Receive, ctx);
        self.try_grant(ctx)
    }

    fn complete_time_constrained(&mut self, ctx: Collaborators<'_, T>) {
        self.time_constrained_pending = false;
        self.time_constrained_enabled = true;

        info!(
            "{}: time constrained enabled at {}",
            self.handle, self.federate_time
        );
        ctx.callbacks.write(
            self.handle,
            Callback::TimeConstrainedEnabled {
                time: self.federate_time,
            },
        );
    }

    /// Enter a new advance request and grant it if possible
    ///
    /// LOTS is computed before anything is touched, so an arithmetic error
    /// leaves the state unchanged. Returns the granted time when the request
    /// was granted immediately.
    pub fn request_advance(
        &mut self,
        request: AdvanceRequest<T>,
        ctx: Collaborators<'_, T>,
    ) -> TimeResult<Option<T>> {
        debug_assert!(self.advance.is_idle(), "advance request already outstanding");

        if let AdvanceRequest::FlushQueue(time) = request {
            return self.flush_queue(time, ctx).map(Some);
        }

        let lots = match self.lookahead {
            Some(lookahead) => Some(self.lots_for(&request, lookahead, ctx)?),
            None => None,
        };

        debug!(
            "{}: {} {:?} (time={}, galt={:?})",
            self.handle,
            request.kind().abbreviation(),
            request.time(),
            self.federate_time,
            self.galt
        );

        self.advance = request;
        if let Some(lots) = lots {
            let lots = self.settle_lots(lots);
            debug!("{}: lots updated to {}", self.handle, lots);
        }

        Ok(self.try_grant(ctx))
    }

    /// FlushQueueRequest: always granted, at the earliest of the requested
    /// time, GALT and LITS; every queued message is offered for delivery
    fn flush_queue(&mut self, time: T, ctx: Collaborators<'_, T>) -> TimeResult<T> {
        let mut granted = earliest(earliest(time, self.galt), self.lits(ctx));
        // an unconstrained federate may already be past GALT
        if granted < self.federate_time {
            granted = self.federate_time;
        }

        let lots = match self.lookahead {
            Some(lookahead) => Some(granted.add(lookahead)?),
            None => None,
        };

        debug!(
            "{}: FQR {} granted at {} (galt={:?})",
            self.handle, time, granted, self.galt
        );

        self.advance = AdvanceRequest::FlushQueue(time);
        if let Some(lots) = lots {
            self.settle_lots(lots);
        }

        let handle = self.handle;
        let retractables = &mut self.retractables;
        let delivered = self.queue.flush(|entry, order| {
            deliver_queued(handle, retractables, ctx.delivery, entry, order)
        });
        trace!("{}: flushed {} messages", self.handle, delivered);

        self.complete_grant(granted, ctx);
        Ok(granted)
    }

    /// Re-evaluate the outstanding request against the current GALT and LITS
    /// per the grant table; returns the granted time
    fn try_grant(&mut self, ctx: Collaborators<'_, T>) -> Option<T> {
        let unconstrained = !self.time_constrained_enabled || self.galt.is_none();
        let galt = self.galt;

        let granted = match self.advance {
            AdvanceRequest::Idle => None,
            AdvanceRequest::TimeAdvance(t) => {
                (unconstrained || galt.is_some_and(|galt| t < galt)).then_some(t)
            }
            AdvanceRequest::TimeAdvanceAvailable(t) => {
                (unconstrained || galt.is_some_and(|galt| t <= galt)).then_some(t)
            }
            AdvanceRequest::NextMessage(t) => match galt {
                Some(galt) if !unconstrained => self.next_message_grant(t, galt, false, ctx),
                _ => Some(t),
            },
            AdvanceRequest::NextMessageAvailable(t) => match galt {
                Some(galt) if !unconstrained => self.next_message_grant(t, galt, true, ctx),
                _ => Some(t),
            },
            AdvanceRequest::FlushQueue(t) => {
                // flushes are granted on entry and never park
                debug_assert!(false, "flush queue request parked");
                Some(t)
            }
        };

        if let Some(time) = granted {
            self.grant(time, ctx);
        }
        granted
    }

    /// Grant for a constrained next message request: the earliest
    /// deliverable message once it is below GALT, else the requested time
    /// once that is. `available` admits times equal to GALT.
    fn next_message_grant(
        &mut self,
        time: T,
        galt: T,
        available: bool,
        ctx: Collaborators<'_, T>,
    ) -> Option<T> {
        let safe = |candidate: T| {
            if available {
                candidate <= galt
            } else {
                candidate < galt
            }
        };

        match self.lits(ctx) {
            Some(lits) if safe(lits) => Some(lits),
            lits if safe(time) => Some(earliest(time, lits)),
            _ => None,
        }
    }

    fn grant(&mut self, time: T, ctx: Collaborators<'_, T>) {
        let handle = self.handle;
        let retractables = &mut self.retractables;
        let delivered = self.queue.deliver_to(time, |entry, order| {
            deliver_queued(handle, retractables, ctx.delivery, entry, order)
        });
        trace!("{}: delivered {} messages up to {}", self.handle, delivered, time);

        self.complete_grant(time, ctx);
    }

    fn complete_grant(&mut self, time: T, ctx: Collaborators<'_, T>) {
        let kind = self.advance.kind();

        trace!(
            "{}: {} grant {} -> {}",
            self.handle,
            kind.abbreviation(),
            self.federate_time,
            time
        );

        self.federate_time = time;
        self.last_advance = kind;
        self.advance = AdvanceRequest::Idle;

        if let Some(lookahead) = self.lookahead {
            match time.add(lookahead_for(kind, lookahead)) {
                Ok(lots) => {
                    self.settle_lots(lots);
                }
                Err(e) => error!("{}: unable to update lots after grant: {}", self.handle, e),
            }
        }

        ctx.callbacks
            .write(self.handle, Callback::TimeAdvanceGrant { time });
    }

    /// LOTS implied by `request` with `lookahead`, before any floor applies
    fn lots_for(
        &mut self,
        request: &AdvanceRequest<T>,
        lookahead: T::Interval,
        ctx: Collaborators<'_, T>,
    ) -> TimeResult<T> {
        let kind = request.kind();
        match *request {
            AdvanceRequest::Idle => self
                .federate_time
                .add(lookahead_for(self.last_advance, lookahead)),
            AdvanceRequest::TimeAdvance(t)
            | AdvanceRequest::TimeAdvanceAvailable(t)
            | AdvanceRequest::FlushQueue(t) => t.add(lookahead_for(kind, lookahead)),
            AdvanceRequest::NextMessage(t) | AdvanceRequest::NextMessageAvailable(t) => {
                let lits = self.lits(ctx);
                earliest(t, lits).add(lookahead_for(kind, lookahead))
            }
        }
    }

    /// Store LOTS, honouring the floor left by a lookahead reduction
    fn settle_lots(&mut self, computed: T) -> T {
        let lots = match self.lots_floor {
            Some(floor) if computed < floor => floor,
            _ => {
                self.lots_floor = None;
                computed
            }
        };
        self.lots = Some(lots);
        lots
    }

    /// A parked next message request's LOTS follows LITS; recompute it after
    /// the queue changed. Returns whether LOTS changed.
    fn refresh_next_message_lots(&mut self, ctx: Collaborators<'_, T>) -> bool {
        let Some(lookahead) = self.lookahead else {
            return false;
        };
        let request = self.advance;
        if !matches!(
            request,
            AdvanceRequest::NextMessage(_) | AdvanceRequest::NextMessageAvailable(_)
        ) {
            return false;
        }

        match self.lots_for(&request, lookahead, ctx) {
            Ok(computed) => {
                let previous = self.lots;
                let lots = self.settle_lots(computed);
                if previous != Some(lots) {
                    debug!("{}: lots follows lits to {}", self.handle, lots);
                }
                previous != Some(lots)
            }
            Err(e) => {
                error!("{}: unable to recompute lots: {}", self.handle, e);
                false
            }
        }
    }

    /// The federation GALT moved past this federate's copy. Completes a
    /// pending constrained enable, or re-checks the parked request.
    /// Returns the granted time, if any.
    pub fn galt_advanced(&mut self, galt: T, ctx: Collaborators<'_, T>) -> Option<T> {
        match self.galt {
            None => debug!("{}: galt defined at {}", self.handle, galt),
            Some(previous) => trace!("{}: galt {} -> {}", self.handle, previous, galt),
        }

        self.galt = Some(galt);

        // nothing at or before GALT can be retracted any more
        self.retractables.expire(galt);

        ctx.callbacks
            .write(self.handle, Callback::GaltAdvanced { time: galt });

        if self.time_constrained_pending && self.federate_time < galt {
            self.complete_time_constrained(ctx);
            return None;
        }
        self.try_grant(ctx)
    }

    /// No regulating federates remain: nothing can be ordered any more, so
    /// the whole queue goes out in receive order and parked requests grant
    pub fn galt_undefined(&mut self, ctx: Collaborators<'_, T>) -> Option<T> {
        debug!("{}: galt undefined", self.handle);

        self.galt = None;
        self.deliver_all(OrderType::Receive, ctx);

        ctx.callbacks.write(self.handle, Callback::GaltUndefined);

        if self.time_constrained_pending {
            self.complete_time_constrained(ctx);
        }
        self.try_grant(ctx)
    }

    fn deliver_all(&mut self, order: OrderType, ctx: Collaborators<'_, T>) {
        let handle = self.handle;
        let retractables = &mut self.retractables;
        let delivered = self.queue.deliver_all(order, |entry, order| {
            deliver_queued(handle, retractables, ctx.delivery, entry, order)
        });
        if delivered > 0 {
            debug!("{}: delivered {} queued messages", self.handle, delivered);
        }
    }

    /// Route a message from another federate: timestamp-order messages wait
    /// in the TSO queue while this federate is constrained, everything else
    /// is delivered now in receive order
    pub fn receive(&mut self, message: Message<T>, ctx: Collaborators<'_, T>) -> Receipt {
        match message.sent_order {
            SentOrder::Timestamp { time, retraction } if self.time_constrained_enabled => {
                if !self.queue.add(time, retraction, message) {
                    return Receipt::Dropped;
                }
                trace!("{}: queued {} at {}", self.handle, retraction, time);
                Receipt::Queued {
                    lots_changed: self.refresh_next_message_lots(ctx),
                }
            }
            SentOrder::Timestamp { time, retraction } => {
                if self.retractables.contains(&retraction) {
                    return Receipt::Dropped;
                }
                if !ctx.delivery.deliver(self.handle, &message, OrderType::Receive) {
                    return Receipt::Dropped;
                }
                self.retractables.add(retraction, time);
                Receipt::Delivered
            }
            SentOrder::Receive => {
                if ctx.delivery.deliver(self.handle, &message, OrderType::Receive) {
                    Receipt::Delivered
                } else {
                    Receipt::Dropped
                }
            }
        }
    }

    /// Retract a message at this federate: cancel it if still queued,
    /// otherwise forward a best-effort retract if it was already delivered
    pub fn retract(
        &mut self,
        retraction: MessageRetractionHandle,
        ctx: Collaborators<'_, T>,
    ) -> RetractOutcome {
        if self.queue.cancel(&retraction) {
            debug!("{}: cancelled queued {}", self.handle, retraction);
            return RetractOutcome::Cancelled {
                lots_changed: self.refresh_next_message_lots(ctx),
            };
        }

        if self.retractables.remove(&retraction) {
            debug!("{}: forwarding retract of {}", self.handle, retraction);
            ctx.callbacks.write(
                self.handle,
                Callback::Retract { handle: retraction },
            );
            return RetractOutcome::Forwarded;
        }
        RetractOutcome::Unknown
    }

    /// Resignation: drop everything still queued
    pub fn discard(&mut self) {
        let discarded = self.queue.len();
        self.queue.clear();
        self.retractables.clear();
        if discarded > 0 {
            debug!("{}: discarded {} queued messages", self.handle, discarded);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use rti_core::{MessagePayload, ObjectInstanceHandle};
    use rti_time::{Integer64Interval, Integer64Time};

    type Time = Integer64Time;

    fn t(value: i64) -> Time {
        Integer64Time::new(value).unwrap()
    }

    fn la(value: i64) -> Integer64Interval {
        Integer64Interval::new(value).unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        delivered: Mutex<Vec<(Option<Time>, OrderType)>>,
        callbacks: Mutex<Vec<Callback<Time>>>,
    }

    impl MessageDelivery<Time> for Recorder {
        fn would_deliver(&self, _federate: FederateHandle, _message: &Message<Time>) -> bool {
            true
        }

        fn deliver(
            &self,
            _federate: FederateHandle,
            message: &Message<Time>,
            received_order: OrderType,
        ) -> bool {
            self.delivered.lock().push((message.time(), received_order));
            true
        }
    }

    impl CallbackSink<Time> for Recorder {
        fn write(&self, _federate: FederateHandle, callback: Callback<Time>) {
            self.callbacks.lock().push(callback);
        }
    }

    impl Recorder {
        fn ctx(&self) -> Collaborators<'_, Time> {
            Collaborators {
                delivery: self,
                callbacks: self,
            }
        }

        fn grants(&self) -> Vec<Time> {
            self.callbacks
                .lock()
                .iter()
                .filter_map(|callback| match callback {
                    Callback::TimeAdvanceGrant { time } => Some(*time),
                    _ => None,
                })
                .collect()
        }
    }

    const ME: FederateHandle = FederateHandle(1);
    const PEER: FederateHandle = FederateHandle(2);

    fn tso(time: i64, serial: u64) -> Message<Time> {
        Message::timestamp_order(
            PEER,
            t(time),
            MessageRetractionHandle::new(PEER, serial),
            MessagePayload::DeleteObjectInstance {
                object_instance: ObjectInstanceHandle(serial),
            },
        )
    }

    fn constrained(galt: i64, recorder: &Recorder) -> FederateTimeState<Time> {
        let mut state = FederateTimeState::new(ME, Some(t(galt)));
        assert!(state.enable_time_constrained(recorder.ctx()));
        state
    }

    #[test]
    fn test_unconstrained_tar_grants_immediately() {
        let recorder = Recorder::default();
        let mut state = FederateTimeState::new(ME, Some(t(3)));

        let granted = state
            .request_advance(AdvanceRequest::TimeAdvance(t(50)), recorder.ctx())
            .unwrap();

        assert_eq!(granted, Some(t(50)));
        assert_eq!(state.federate_time(), t(50));
        assert!(state.advance_request().is_idle());
        assert_eq!(state.last_advance(), TimeAdvanceType::TimeAdvanceRequest);
        assert_eq!(recorder.grants(), vec![t(50)]);
    }

    #[test]
    fn test_zero_lookahead_epsilon_only_for_strict_requests() {
        let recorder = Recorder::default();
        let mut state = FederateTimeState::new(ME, None);
        state
            .enable_time_regulation(la(0), t(0), recorder.ctx())
            .unwrap();
        assert_eq!(state.lots(), Some(t(0)));

        state
            .request_advance(AdvanceRequest::TimeAdvance(t(10)), recorder.ctx())
            .unwrap();
        assert_eq!(state.lots(), Some(t(11)));

        state
            .request_advance(AdvanceRequest::TimeAdvanceAvailable(t(20)), recorder.ctx())
            .unwrap();
        assert_eq!(state.lots(), Some(t(20)));
    }

    #[test]
    fn test_constrained_tar_waits_for_galt() {
        let recorder = Recorder::default();
        let mut state = constrained(10, &recorder);

        let granted = state
            .request_advance(AdvanceRequest::TimeAdvance(t(10)), recorder.ctx())
            .unwrap();
        assert_eq!(granted, None);
        assert_eq!(state.advance_request(), AdvanceRequest::TimeAdvance(t(10)));

        assert_eq!(state.galt_advanced(t(11), recorder.ctx()), Some(t(10)));
        assert_eq!(state.federate_time(), t(10));
    }

    #[test]
    fn test_tara_grants_at_galt() {
        let recorder = Recorder::default();
        let mut state = constrained(10, &recorder);

        let granted = state
            .request_advance(AdvanceRequest::TimeAdvanceAvailable(t(10)), recorder.ctx())
            .unwrap();
        assert_eq!(granted, Some(t(10)));
    }

    #[test]
    fn test_nmr_grants_at_lits_and_delivers() {
        let recorder = Recorder::default();
        let mut state = constrained(8, &recorder);

        assert_eq!(
            state.receive(tso(5, 1), recorder.ctx()),
            Receipt::Queued { lots_changed: false }
        );
        assert_eq!(
            state.receive(tso(9, 2), recorder.ctx()),
            Receipt::Queued { lots_changed: false }
        );

        let granted = state
            .request_advance(AdvanceRequest::NextMessage(t(20)), recorder.ctx())
            .unwrap();

        assert_eq!(granted, Some(t(5)));
        assert_eq!(
            *recorder.delivered.lock(),
            vec![(Some(t(5)), OrderType::Timestamp)]
        );
        assert_eq!(state.queued_messages(), 1);
    }

    #[test]
    fn test_parked_nmr_lots_follows_lits() {
        let recorder = Recorder::default();
        let mut state = constrained(3, &recorder);
        state
            .enable_time_regulation(la(2), t(0), recorder.ctx())
            .unwrap();

        state
            .request_advance(AdvanceRequest::NextMessage(t(10)), recorder.ctx())
            .unwrap();
        assert_eq!(state.lots(), Some(t(12)));

        assert_eq!(
            state.receive(tso(6, 1), recorder.ctx()),
            Receipt::Queued { lots_changed: true }
        );
        assert_eq!(state.lots(), Some(t(8)));

        assert_eq!(
            state.retract(MessageRetractionHandle::new(PEER, 1), recorder.ctx()),
            RetractOutcome::Cancelled { lots_changed: true }
        );
        assert_eq!(state.lots(), Some(t(12)));
    }

    #[test]
    fn test_constrained_enable_pending_until_galt_passes() {
        let recorder = Recorder::default();
        let mut state = FederateTimeState::new(ME, Some(t(0)));
        state
            .request_advance(AdvanceRequest::TimeAdvance(t(5)), recorder.ctx())
            .unwrap();

        assert!(!state.enable_time_constrained(recorder.ctx()));
        assert!(state.is_time_constrained_pending());

        state.galt_advanced(t(5), recorder.ctx());
        assert!(state.is_time_constrained_pending());

        state.galt_advanced(t(6), recorder.ctx());
        assert!(state.is_time_constrained_enabled());
        assert!(!state.is_time_constrained_pending());
        assert!(recorder
            .callbacks
            .lock()
            .contains(&Callback::TimeConstrainedEnabled { time: t(5) }));
    }

    #[test]
    fn test_retract_delivered_message_forwards() {
        let recorder = Recorder::default();
        let mut state = constrained(8, &recorder);
        state.receive(tso(5, 1), recorder.ctx());
        state
            .request_advance(AdvanceRequest::TimeAdvance(t(6)), recorder.ctx())
            .unwrap();

        let handle = MessageRetractionHandle::new(PEER, 1);
        assert_eq!(state.retract(handle, recorder.ctx()), RetractOutcome::Forwarded);
        assert!(recorder
            .callbacks
            .lock()
            .contains(&Callback::Retract { handle }));
        assert_eq!(state.retract(handle, recorder.ctx()), RetractOutcome::Unknown);
    }

    #[test]
    fn test_duplicate_delivery_suppressed() {
        let recorder = Recorder::default();
        let mut state = FederateTimeState::new(ME, None);

        assert_eq!(state.receive(tso(5, 1), recorder.ctx()), Receipt::Delivered);
        assert_eq!(state.receive(tso(5, 1), recorder.ctx()), Receipt::Dropped);
        assert_eq!(recorder.delivered.lock().len(), 1);
    }

    #[test]
    fn test_lookahead_reduction_never_lowers_lots() {
        let recorder = Recorder::default();
        let mut state = FederateTimeState::new(ME, None);
        state
            .enable_time_regulation(la(10), t(0), recorder.ctx())
            .unwrap();

        assert!(!state.modify_lookahead(la(2), recorder.ctx()).unwrap());
        assert_eq!(state.lots(), Some(t(10)));

        state
            .request_advance(AdvanceRequest::TimeAdvance(t(5)), recorder.ctx())
            .unwrap();
        assert_eq!(state.lots(), Some(t(10)));

        state
            .request_advance(AdvanceRequest::TimeAdvance(t(9)), recorder.ctx())
            .unwrap();
        assert_eq!(state.lots(), Some(t(11)));

        assert!(state.modify_lookahead(la(4), recorder.ctx()).unwrap());
        assert_eq!(state.lots(), Some(t(13)));
    }

    #[test]
    fn test_galt_undefined_delivers_queue_and_grants() {
        let recorder = Recorder::default();
        let mut state = constrained(2, &recorder);
        state.receive(tso(7, 1), recorder.ctx());
        state
            .request_advance(AdvanceRequest::TimeAdvance(t(5)), recorder.ctx())
            .unwrap();

        assert_eq!(state.galt_undefined(recorder.ctx()), Some(t(5)));
        assert_eq!(state.galt(), None);
        assert_eq!(state.queued_messages(), 0);
        assert_eq!(
            *recorder.delivered.lock(),
            vec![(Some(t(7)), OrderType::Receive)]
        );
    }

    #[test]
    fn test_flush_queue_grants_earliest() {
        let recorder = Recorder::default();
        let mut state = constrained(50, &recorder);
        state.receive(tso(30, 1), recorder.ctx());
        state.receive(tso(70, 2), recorder.ctx());

        let granted = state
            .request_advance(AdvanceRequest::FlushQueue(t(100)), recorder.ctx())
            .unwrap();

        assert_eq!(granted, Some(t(30)));
        assert_eq!(state.queued_messages(), 0);
        assert_eq!(recorder.delivered.lock().len(), 2);
        assert_eq!(state.last_advance(), TimeAdvanceType::FlushQueueRequest);
    }

    #[test]
    fn test_flush_queue_bounded_by_galt_when_unconstrained() {
        let recorder = Recorder::default();
        let mut state = FederateTimeState::new(ME, Some(t(50)));

        let granted = state
            .request_advance(AdvanceRequest::FlushQueue(t(100)), recorder.ctx())
            .unwrap();
        assert_eq!(granted, Some(t(50)));

        // never granted behind its own time
        state
            .request_advance(AdvanceRequest::TimeAdvance(t(80)), recorder.ctx())
            .unwrap();
        let granted = state
            .request_advance(AdvanceRequest::FlushQueue(t(100)), recorder.ctx())
            .unwrap();
        assert_eq!(granted, Some(t(80)));
        assert_eq!(recorder.grants(), vec![t(50), t(80), t(80)]);
    }

    #[test]
    fn test_nmr_grants_lits_beyond_requested_time_when_safe() {
        let recorder = Recorder::default();
        let mut state = constrained(25, &recorder);
        state.receive(tso(7, 1), recorder.ctx());

        let granted = state
            .request_advance(AdvanceRequest::NextMessage(t(5)), recorder.ctx())
            .unwrap();

        assert_eq!(granted, Some(t(7)));
        assert_eq!(state.federate_time(), t(7));
        assert_eq!(
            *recorder.delivered.lock(),
            vec![(Some(t(7)), OrderType::Timestamp)]
        );
    }

    #[test]
    fn test_nmr_falls_back_to_requested_time_when_lits_unsafe() {
        let recorder = Recorder::default();
        let mut state = constrained(10, &recorder);
        state.receive(tso(12, 1), recorder.ctx());

        let granted = state
            .request_advance(AdvanceRequest::NextMessage(t(6)), recorder.ctx())
            .unwrap();

        assert_eq!(granted, Some(t(6)));
        assert_eq!(state.queued_messages(), 1);
    }

    #[test]
    fn test_nmra_grants_lits_equal_to_galt() {
        let recorder = Recorder::default();
        let mut state = constrained(9, &recorder);
        state.receive(tso(9, 1), recorder.ctx());

        let strict = state
            .request_advance(AdvanceRequest::NextMessage(t(20)), recorder.ctx())
            .unwrap();
        assert_eq!(strict, None);
        assert_eq!(state.advance_request(), AdvanceRequest::NextMessage(t(20)));

        let mut state = constrained(9, &recorder);
        state.receive(tso(9, 2), recorder.ctx());
        let granted = state
            .request_advance(AdvanceRequest::NextMessageAvailable(t(20)), recorder.ctx())
            .unwrap();
        assert_eq!(granted, Some(t(9)));
        assert_eq!(state.last_advance(), TimeAdvanceType::NextMessageRequestAvailable);
        assert_eq!(state.queued_messages(), 0);
    }

    #[test]
    fn test_nmra_grants_requested_time_equal_to_galt() {
        let recorder = Recorder::default();
        let mut state = constrained(9, &recorder);

        let granted = state
            .request_advance(AdvanceRequest::NextMessageAvailable(t(9)), recorder.ctx())
            .unwrap();
        assert_eq!(granted, Some(t(9)));
    }

    #[test]
    fn test_nmra_zero_lookahead_keeps_lots_at_grant() {
        let recorder = Recorder::default();
        let mut state = constrained(10, &recorder);
        state
            .enable_time_regulation(la(0), t(0), recorder.ctx())
            .unwrap();
        state.receive(tso(4, 1), recorder.ctx());

        let granted = state
            .request_advance(AdvanceRequest::NextMessageAvailable(t(20)), recorder.ctx())
            .unwrap();
        assert_eq!(granted, Some(t(4)));
        assert_eq!(state.lots(), Some(t(4)));

        // the strict variant still steps past its grant
        state.receive(tso(6, 2), recorder.ctx());
        let granted = state
            .request_advance(AdvanceRequest::NextMessage(t(20)), recorder.ctx())
            .unwrap();
        assert_eq!(granted, Some(t(6)));
        assert_eq!(state.lots(), Some(t(7)));
    }

    #[test]
    fn test_arithmetic_error_leaves_state_unchanged() {
        let recorder = Recorder::default();
        let mut state = FederateTimeState::new(ME, None);
        state
            .enable_time_regulation(la(1), t(0), recorder.ctx())
            .unwrap();

        let result =
            state.request_advance(AdvanceRequest::TimeAdvance(Time::FINAL), recorder.ctx());

        assert!(result.is_err());
        assert!(state.advance_request().is_idle());
        assert_eq!(state.lots(), Some(t(1)));
        assert_eq!(state.federate_time(), t(0));
    }
}
