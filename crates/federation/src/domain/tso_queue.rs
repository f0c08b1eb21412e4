use rti_core::{FederateHandle, Message, MessageRetractionHandle, OrderType};
use rti_ports::LogicalTime;
use std::collections::{BTreeMap, HashMap};

/// Queue key: timestamp first, arrival sequence to keep ties stable
type QueueKey<T> = (T, u64);

/// A timestamp-ordered message waiting for its receiver's time to catch up
#[derive(Debug, Clone)]
pub struct QueuedMessage<T> {
    pub time: T,
    pub retraction: MessageRetractionHandle,
    pub message: Message<T>,
    sequence: u64,
    cancelled: bool,
}

impl<T> QueuedMessage<T> {
    pub fn producer(&self) -> FederateHandle {
        self.message.producer
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Per-federate holding area for timestamp-ordered messages that are not yet
/// safe to deliver
///
/// Entries are kept in timestamp order (arrival order among equal
/// timestamps). Delivery is delegated to a caller-supplied closure so the
/// queue itself knows nothing about subscriptions or transport; the closure
/// returns whether anything was actually sent.
pub struct TimeStampOrderedQueue<T: LogicalTime> {
    entries: BTreeMap<QueueKey<T>, QueuedMessage<T>>,
    /// Live (not cancelled) entries only
    by_handle: HashMap<MessageRetractionHandle, QueueKey<T>>,
    next_sequence: u64,
}

impl<T: LogicalTime> TimeStampOrderedQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            by_handle: HashMap::new(),
            next_sequence: 0,
        }
    }

    /// Insert a message, keeping timestamp order
    ///
    /// Returns false (and queues nothing) if a live entry already uses the
    /// same retraction handle.
    pub fn add(
        &mut self,
        time: T,
        retraction: MessageRetractionHandle,
        message: Message<T>,
    ) -> bool {
        if self.by_handle.contains_key(&retraction) {
            return false;
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let key = (time, sequence);
        self.by_handle.insert(retraction, key);
        self.entries.insert(
            key,
            QueuedMessage {
                time,
                retraction,
                message,
                sequence,
                cancelled: false,
            },
        );
        true
    }

    /// Mark a queued message as cancelled
    ///
    /// False means the handle is unknown here: it was never queued or was
    /// already delivered, and the caller has to chase it downstream.
    pub fn cancel(&mut self, retraction: &MessageRetractionHandle) -> bool {
        let Some(key) = self.by_handle.remove(retraction) else {
            return false;
        };
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.cancelled = true;
        }
        true
    }

    /// Timestamp of the first live entry that would actually be delivered
    ///
    /// Cancelled entries met on the way are purged. Entries the federate
    /// would not receive (e.g. unsubscribed) are skipped but kept.
    pub fn lits<F>(&mut self, mut would_deliver: F) -> Option<T>
    where
        F: FnMut(&QueuedMessage<T>) -> bool,
    {
        let mut purged = Vec::new();
        let mut lits = None;

        for (key, entry) in &self.entries {
            if entry.cancelled {
                purged.push(*key);
            } else if would_deliver(entry) {
                lits = Some(entry.time);
                break;
            }
        }

        for key in purged {
            self.entries.remove(&key);
        }
        lits
    }

    /// Same as `lits` without purging; for read-only snapshots
    pub fn peek_lits<F>(&self, mut would_deliver: F) -> Option<T>
    where
        F: FnMut(&QueuedMessage<T>) -> bool,
    {
        self.entries
            .values()
            .find(|entry| !entry.cancelled && would_deliver(entry))
            .map(|entry| entry.time)
    }

    /// Deliver, in timestamp order, every entry at or before `time`
    ///
    /// Entries are removed whether or not the delivery sent anything; a
    /// failed delivery never stops the scan. Returns the number of entries
    /// actually delivered.
    pub fn deliver_to<F>(&mut self, time: T, mut deliver: F) -> usize
    where
        F: FnMut(&QueuedMessage<T>, OrderType) -> bool,
    {
        let mut delivered = 0;
        while let Some(entry) = self.entries.first_entry() {
            if entry.key().0 > time {
                break;
            }
            let entry = entry.remove();
            if entry.cancelled {
                continue;
            }
            self.by_handle.remove(&entry.retraction);
            if deliver(&entry, OrderType::Timestamp) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Try to deliver everything regardless of timestamp, in timestamp order
    ///
    /// Delivered and cancelled entries are removed; entries whose delivery
    /// sent nothing stay queued.
    pub fn flush<F>(&mut self, mut deliver: F) -> usize
    where
        F: FnMut(&QueuedMessage<T>, OrderType) -> bool,
    {
        let by_handle = &mut self.by_handle;
        let mut delivered = 0;

        self.entries.retain(|_, entry| {
            if entry.cancelled {
                return false;
            }
            if deliver(entry, OrderType::Timestamp) {
                by_handle.remove(&entry.retraction);
                delivered += 1;
                return false;
            }
            true
        });
        delivered
    }

    /// Unconditionally deliver the whole queue in arrival order and empty it
    pub fn deliver_all<F>(&mut self, order: OrderType, mut deliver: F) -> usize
    where
        F: FnMut(&QueuedMessage<T>, OrderType) -> bool,
    {
        let mut entries: Vec<QueuedMessage<T>> = std::mem::take(&mut self.entries)
            .into_values()
            .filter(|entry| !entry.cancelled)
            .collect();
        entries.sort_by_key(|entry| entry.sequence);
        self.by_handle.clear();

        let mut delivered = 0;
        for entry in &entries {
            if deliver(entry, order) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Drop everything without delivering
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_handle.clear();
    }

    /// Number of live (not cancelled) entries
    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }

    pub fn contains(&self, retraction: &MessageRetractionHandle) -> bool {
        self.by_handle.contains_key(retraction)
    }
}

impl<T: LogicalTime> Default for TimeStampOrderedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rti_core::{InteractionClassHandle, MessagePayload};
    use rti_time::Integer64Time;

    const PRODUCER: FederateHandle = FederateHandle(1);

    fn time(value: i64) -> Integer64Time {
        Integer64Time::new(value).unwrap()
    }

    fn handle(serial: u64) -> MessageRetractionHandle {
        MessageRetractionHandle::new(PRODUCER, serial)
    }

    fn enqueue(queue: &mut TimeStampOrderedQueue<Integer64Time>, at: i64, serial: u64, class: u32) {
        let message = Message::timestamp_order(
            PRODUCER,
            time(at),
            handle(serial),
            MessagePayload::SendInteraction {
                interaction_class: InteractionClassHandle(class),
                parameters: Vec::new(),
            },
        );
        assert!(queue.add(time(at), handle(serial), message));
    }

    fn class_of(entry: &QueuedMessage<Integer64Time>) -> u32 {
        match &entry.message.payload {
            MessagePayload::SendInteraction {
                interaction_class, ..
            } => interaction_class.0,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_lits_is_earliest_deliverable() {
        let mut queue = TimeStampOrderedQueue::new();
        enqueue(&mut queue, 20, 1, 0);
        enqueue(&mut queue, 15, 2, 0);
        enqueue(&mut queue, 30, 3, 0);

        assert_eq!(queue.lits(|_| true), Some(time(15)));
    }

    #[test]
    fn test_lits_skips_entries_that_would_not_be_delivered() {
        let mut queue = TimeStampOrderedQueue::new();
        enqueue(&mut queue, 10, 1, 7);
        enqueue(&mut queue, 12, 2, 0);

        // class 7 is not subscribed
        assert_eq!(queue.lits(|entry| class_of(entry) != 7), Some(time(12)));
        // skipped, not dropped
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_lits_none_when_nothing_deliverable() {
        let mut queue = TimeStampOrderedQueue::new();
        assert_eq!(queue.lits(|_| true), None);

        enqueue(&mut queue, 10, 1, 7);
        assert_eq!(queue.lits(|_| false), None);
    }

    #[test]
    fn test_cancel_twice() {
        let mut queue = TimeStampOrderedQueue::new();
        enqueue(&mut queue, 15, 1, 0);

        assert!(queue.cancel(&handle(1)));
        assert!(!queue.cancel(&handle(1)));
        assert_eq!(queue.lits(|_| true), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_cancel_after_delivery_fails() {
        let mut queue = TimeStampOrderedQueue::new();
        enqueue(&mut queue, 5, 1, 0);

        assert_eq!(queue.deliver_to(time(5), |_, _| true), 1);
        assert!(!queue.cancel(&handle(1)));
    }

    #[test]
    fn test_deliver_to_is_prefix_in_timestamp_order() {
        let mut queue = TimeStampOrderedQueue::new();
        enqueue(&mut queue, 30, 1, 0);
        enqueue(&mut queue, 10, 2, 0);
        enqueue(&mut queue, 20, 3, 0);

        let mut seen = Vec::new();
        let delivered = queue.deliver_to(time(20), |entry, order| {
            assert_eq!(order, OrderType::Timestamp);
            seen.push(entry.time);
            true
        });

        assert_eq!(delivered, 2);
        assert_eq!(seen, vec![time(10), time(20)]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.lits(|_| true), Some(time(30)));
    }

    #[test]
    fn test_deliver_to_failed_entries_removed_and_do_not_block() {
        let mut queue = TimeStampOrderedQueue::new();
        enqueue(&mut queue, 10, 1, 7);
        enqueue(&mut queue, 11, 2, 0);

        let delivered = queue.deliver_to(time(11), |entry, _| class_of(entry) != 7);

        assert_eq!(delivered, 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_equal_timestamps_keep_arrival_order() {
        let mut queue = TimeStampOrderedQueue::new();
        enqueue(&mut queue, 10, 1, 1);
        enqueue(&mut queue, 10, 2, 2);
        enqueue(&mut queue, 10, 3, 3);

        let mut classes = Vec::new();
        queue.deliver_to(time(10), |entry, _| {
            classes.push(class_of(entry));
            true
        });
        assert_eq!(classes, vec![1, 2, 3]);
    }

    #[test]
    fn test_flush_keeps_undelivered_entries() {
        let mut queue = TimeStampOrderedQueue::new();
        enqueue(&mut queue, 100, 1, 0);
        enqueue(&mut queue, 10, 2, 7);
        enqueue(&mut queue, 50, 3, 0);
        queue.cancel(&handle(3));

        let mut seen = Vec::new();
        let delivered = queue.flush(|entry, _| {
            seen.push(entry.time);
            class_of(entry) != 7
        });

        assert_eq!(delivered, 1);
        assert_eq!(seen, vec![time(10), time(100)]);
        assert_eq!(queue.len(), 1);
        assert!(queue.contains(&handle(2)));
    }

    #[test]
    fn test_deliver_all_uses_arrival_order() {
        let mut queue = TimeStampOrderedQueue::new();
        enqueue(&mut queue, 30, 1, 1);
        enqueue(&mut queue, 10, 2, 2);
        enqueue(&mut queue, 20, 3, 3);
        queue.cancel(&handle(3));

        let mut classes = Vec::new();
        let delivered = queue.deliver_all(OrderType::Receive, |entry, order| {
            assert_eq!(order, OrderType::Receive);
            classes.push(class_of(entry));
            true
        });

        assert_eq!(delivered, 2);
        assert_eq!(classes, vec![1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_duplicate_handle_rejected() {
        let mut queue = TimeStampOrderedQueue::new();
        enqueue(&mut queue, 10, 1, 0);

        let duplicate = Message::timestamp_order(
            PRODUCER,
            time(12),
            handle(1),
            MessagePayload::DeleteObjectInstance {
                object_instance: rti_core::ObjectInstanceHandle(1),
            },
        );
        assert!(!queue.add(time(12), handle(1), duplicate));
        assert_eq!(queue.len(), 1);
    }
}
