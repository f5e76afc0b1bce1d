//! Cooperative delayed-callback queue.
//!
//! Everything the agent does over time is expressed as "schedule an event
//! for later and return". The queue never cancels anything: a handler that
//! fires after its sequence has been abandoned re-checks agent state and
//! does nothing.
//!
//! Events due at the same instant run in the order they were scheduled.
//! That makes runs reproducible, but behaviour must not depend on it beyond
//! what distinct delays already order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::time::TimeMs;

/// An event waiting in the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scheduled<E> {
    /// When the event fires.
    pub due: TimeMs,
    /// Insertion order, for tie-breaking.
    pub seq: u64,
    /// The event.
    pub event: E,
}

impl<E: PartialEq> Eq for Scheduled<E> {}

impl<E: PartialEq> Ord for Scheduled<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap and we want the earliest first.
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<E: PartialEq> PartialOrd for Scheduled<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of delayed events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scheduler<E: PartialEq> {
    queue: BinaryHeap<Scheduled<E>>,
    next_seq: u64,
}

impl<E: PartialEq> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PartialEq> Scheduler<E> {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Queue `event` to fire at `now + delay`.
    pub fn schedule(&mut self, now: TimeMs, delay: TimeMs, event: E) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Scheduled {
            due: now.saturating_add(delay),
            seq,
            event,
        });
    }

    /// Due time of the earliest event.
    #[must_use]
    pub fn next_due(&self) -> Option<TimeMs> {
        self.queue.peek().map(|s| s.due)
    }

    /// Pop the earliest event if it is due at or before `now`.
    pub fn pop_due(&mut self, now: TimeMs) -> Option<Scheduled<E>> {
        if self.next_due()? <= now {
            self.queue.pop()
        } else {
            None
        }
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pops_in_time_order() {
        let mut s = Scheduler::new();
        s.schedule(0, 300, "c");
        s.schedule(0, 100, "a");
        s.schedule(0, 200, "b");

        assert_eq!(s.pop_due(50), None);
        assert_eq!(s.pop_due(1000).map(|e| e.event), Some("a"));
        assert_eq!(s.pop_due(1000).map(|e| e.event), Some("b"));
        assert_eq!(s.pop_due(1000).map(|e| e.event), Some("c"));
        assert!(s.is_empty());
    }

    #[test]
    fn test_ties_run_in_insertion_order() {
        let mut s = Scheduler::new();
        for n in 0..5 {
            s.schedule(10, 0, n);
        }
        let order: Vec<_> = std::iter::from_fn(|| s.pop_due(10).map(|e| e.event)).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_pop_due_respects_now() {
        let mut s = Scheduler::new();
        s.schedule(100, 60, ());
        assert_eq!(s.next_due(), Some(160));
        assert!(s.pop_due(159).is_none());
        assert!(s.pop_due(160).is_some());
    }
}
