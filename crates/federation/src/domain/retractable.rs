use priority_queue::PriorityQueue;
use rti_core::MessageRetractionHandle;
use rti_ports::LogicalTime;
use std::cmp::Reverse;

/// Timestamp-ordered messages already delivered to one federate that can
/// still be retracted
///
/// A record lives until the federate's GALT passes the message time (it can
/// no longer be retracted after that) or until the message is retracted.
/// While it lives, a second delivery of the same message is suppressed.
pub struct RetractableRegistry<T: LogicalTime> {
    /// Min-heap on expiration time
    retractables: PriorityQueue<MessageRetractionHandle, Reverse<T>>,
}

impl<T: LogicalTime> RetractableRegistry<T> {
    pub fn new() -> Self {
        Self {
            retractables: PriorityQueue::new(),
        }
    }

    /// Record a delivery; false if the handle is already recorded
    pub fn add(&mut self, handle: MessageRetractionHandle, expiration: T) -> bool {
        if self.retractables.get(&handle).is_some() {
            return false;
        }
        self.retractables.push(handle, Reverse(expiration));
        true
    }

    pub fn contains(&self, handle: &MessageRetractionHandle) -> bool {
        self.retractables.get(handle).is_some()
    }

    /// Forget a record because the message was retracted
    pub fn remove(&mut self, handle: &MessageRetractionHandle) -> bool {
        self.retractables.remove(handle).is_some()
    }

    /// Drop every record whose expiration is at or before `time`
    pub fn expire(&mut self, time: T) -> usize {
        let mut expired = 0;
        while let Some((_, Reverse(expiration))) = self.retractables.peek() {
            if *expiration > time {
                break;
            }
            self.retractables.pop();
            expired += 1;
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.retractables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retractables.is_empty()
    }

    pub fn clear(&mut self) {
        self.retractables.clear();
    }
}

impl<T: LogicalTime> Default for RetractableRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rti_core::FederateHandle;
    use rti_time::Integer64Time;

    fn handle(serial: u64) -> MessageRetractionHandle {
        MessageRetractionHandle::new(FederateHandle(1), serial)
    }

    fn time(value: i64) -> Integer64Time {
        Integer64Time::new(value).unwrap()
    }

    #[test]
    fn test_duplicate_add_is_suppressed() {
        let mut registry = RetractableRegistry::new();
        assert!(registry.add(handle(1), time(10)));
        assert!(!registry.add(handle(1), time(20)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_expire_removes_up_to_and_including_time() {
        let mut registry = RetractableRegistry::new();
        registry.add(handle(1), time(10));
        registry.add(handle(2), time(20));
        registry.add(handle(3), time(30));

        assert_eq!(registry.expire(time(20)), 2);
        assert!(!registry.contains(&handle(1)));
        assert!(!registry.contains(&handle(2)));
        assert!(registry.contains(&handle(3)));
    }

    #[test]
    fn test_expire_before_everything_is_a_no_op() {
        let mut registry = RetractableRegistry::new();
        registry.add(handle(1), time(10));

        assert_eq!(registry.expire(time(9)), 0);
        assert!(registry.contains(&handle(1)));
    }

    #[test]
    fn test_remove_then_add_again() {
        let mut registry = RetractableRegistry::new();
        registry.add(handle(1), time(10));

        assert!(registry.remove(&handle(1)));
        assert!(!registry.remove(&handle(1)));
        assert!(registry.add(handle(1), time(10)));
    }
}
