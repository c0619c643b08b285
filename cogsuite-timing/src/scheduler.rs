use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

use tracing::debug;

/// Tag that changes every time pending callbacks are invalidated.
///
/// A [`Fired`] event whose generation differs from the scheduler's current one
/// belongs to an abandoned session and must be ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }
}

/// A callback whose due time has passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<E> {
    pub due_ns: u64,
    pub generation: Generation,
    pub event: E,
}

struct Pending<E> {
    due_ns: u64,
    seq: u64,
    generation: Generation,
    event: E,
}

impl<E> PartialEq for Pending<E> {
    fn eq(&self, other: &Self) -> bool {
        self.due_ns == other.due_ns && self.seq == other.seq
    }
}

impl<E> Eq for Pending<E> {}

impl<E> PartialOrd for Pending<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Pending<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due_ns, self.seq).cmp(&(other.due_ns, other.seq))
    }
}

/// Single-threaded timer queue. Events due at the same instant fire in the
/// order they were scheduled.
pub struct Scheduler<E> {
    heap: BinaryHeap<Reverse<Pending<E>>>,
    generation: Generation,
    next_seq: u64,
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            generation: Generation::default(),
            next_seq: 0,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn schedule_at(&mut self, due_ns: u64, event: E) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Pending {
            due_ns,
            seq,
            generation: self.generation,
            event,
        }));
    }

    pub fn schedule(&mut self, now_ns: u64, delay: Duration, event: E) {
        self.schedule_at(now_ns.saturating_add(delay.as_nanos() as u64), event);
    }

    /// Drops every pending callback and starts a new generation.
    pub fn invalidate(&mut self) -> Generation {
        let dropped = self.heap.len();
        self.heap.clear();
        self.generation = self.generation.next();
        debug!(dropped, generation = self.generation.0, "timers invalidated");
        self.generation
    }

    pub fn is_current(&self, fired: &Fired<E>) -> bool {
        fired.generation == self.generation
    }

    pub fn next_due(&self) -> Option<u64> {
        self.heap.peek().map(|Reverse(p)| p.due_ns)
    }

    /// Removes and returns the earliest callback due at or before `now_ns`.
    pub fn pop_due(&mut self, now_ns: u64) -> Option<Fired<E>> {
        if self.next_due()? > now_ns {
            return None;
        }
        self.heap.pop().map(|Reverse(p)| Fired {
            due_ns: p.due_ns,
            generation: p.generation,
            event: p.event,
        })
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_due_then_insertion_order() {
        let mut s = Scheduler::new();
        s.schedule_at(20, "late");
        s.schedule_at(10, "first");
        s.schedule_at(10, "second");
        assert_eq!(s.pop_due(5), None);
        assert_eq!(s.pop_due(15).map(|f| f.event), Some("first"));
        assert_eq!(s.pop_due(15).map(|f| f.event), Some("second"));
        assert_eq!(s.pop_due(15), None);
        assert_eq!(s.next_due(), Some(20));
        assert_eq!(s.pop_due(20).map(|f| f.event), Some("late"));
        assert!(s.is_empty());
    }

    #[test]
    fn invalidate_marks_held_events_stale() {
        let mut s = Scheduler::new();
        s.schedule(0, Duration::from_millis(10), 1u8);
        let held = s.pop_due(10_000_000).expect("due");
        assert!(s.is_current(&held));
        s.schedule(0, Duration::from_millis(20), 2u8);
        s.invalidate();
        assert!(s.is_empty());
        assert!(!s.is_current(&held));
    }
}
