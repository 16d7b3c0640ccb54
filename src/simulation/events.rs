use crate::simulation::Resource;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Urgency of an event. Higher priorities are delivered first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Low,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// Outcome of a resource operation.
///
/// These are steady-state signals, not errors: a failed operation degrades to
/// "emit event, back off, retry" in the subsystem loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationOutcome {
    /// The operation completed in full.
    Ok,
    /// The resource held exactly zero units.
    Empty,
    /// The resource held some units, but fewer than required.
    Insufficient,
    /// Not all produced units fit below the maximum capacity.
    Capacity,
}

impl fmt::Display for OperationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OperationOutcome::Ok => write!(f, "ok"),
            OperationOutcome::Empty => write!(f, "empty"),
            OperationOutcome::Insufficient => write!(f, "insufficient"),
            OperationOutcome::Capacity => write!(f, "at capacity"),
        }
    }
}

/// Record of an abnormal or notable occurrence, queued for monitoring.
///
/// An `Event` is an immutable value; cloning it into and out of the queue
/// shares the resource behind an `Arc` without taking over its lifecycle.
#[derive(Debug, Clone)]
pub struct Event {
    /// Name of the subsystem that generated the event.
    pub source: String,
    /// The resource involved, if any.
    pub resource: Option<Arc<Resource>>,
    /// Outcome of the operation that triggered the event.
    pub outcome: OperationOutcome,
    pub priority: Priority,
    /// Amount held by `resource` when the event was built.
    pub amount: u64,
}

impl Event {
    pub fn new(
        source: String,
        resource: Option<Arc<Resource>>,
        outcome: OperationOutcome,
        priority: Priority,
        amount: u64,
    ) -> Event {
        Event { source, resource, outcome, priority, amount }
    }

    pub fn resource_name(&self) -> &str {
        self.resource.as_ref().map(|r| r.name()).unwrap_or("-")
    }
}

/// A thread-safe priority queue of events.
///
/// Entries are kept sorted by descending priority. A newly pushed event is
/// placed after the entire run of entries with equal or greater priority, so
/// events of equal priority are delivered in push order.
#[derive(Debug, Default)]
pub struct EventQueue {
    queue: Mutex<VecDeque<Event>>,
}

impl EventQueue {
    pub fn new() -> EventQueue {
        EventQueue { queue: Mutex::new(VecDeque::new()) }
    }

    /// Inserts `event` behind all entries that are at least as urgent.
    /// O(size) worst case while holding the lock.
    pub fn push(&self, event: Event) {
        let mut queue = self.queue.lock().unwrap();
        let at = queue.iter().position(|queued| queued.priority < event.priority).unwrap_or_else(|| queue.len());
        queue.insert(at, event);
    }

    /// Removes and returns the most urgent event. `None` on an empty queue is
    /// a normal condition for pollers, not an error.
    pub fn pop(&self) -> Option<Event> {
        self.queue.lock().unwrap().pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use std::thread;

    fn event(priority: Priority, marker: u64) -> Event {
        Event::new("test".to_string(), None, OperationOutcome::Empty, priority, marker)
    }

    #[test]
    fn pops_by_descending_priority() {
        let queue = EventQueue::new();
        queue.push(event(Priority::Low, 0));
        queue.push(event(Priority::High, 1));
        queue.push(event(Priority::Low, 2));
        queue.push(event(Priority::High, 3));

        let priorities: Vec<Priority> = std::iter::from_fn(|| queue.pop()).map(|e| e.priority).collect();
        assert_eq!(priorities, vec![Priority::High, Priority::High, Priority::Low, Priority::Low]);
    }

    #[test]
    fn equal_priorities_stay_in_push_order() {
        let queue = EventQueue::new();
        for marker in 0..5 {
            queue.push(event(Priority::High, marker));
        }
        queue.push(event(Priority::Low, 100));
        for marker in 5..8 {
            queue.push(event(Priority::High, marker));
        }

        let markers: Vec<u64> = std::iter::from_fn(|| queue.pop()).map(|e| e.amount).collect();
        assert_eq!(markers, vec![0, 1, 2, 3, 4, 5, 6, 7, 100]);
    }

    #[test]
    fn size_tracks_pushes_and_pops() {
        let queue = EventQueue::new();
        assert!(queue.is_empty());
        for marker in 0..6 {
            queue.push(event(Priority::Low, marker));
        }
        assert_eq!(queue.len(), 6);
        for popped in 0..4 {
            assert!(queue.pop().is_some(), "pop {} failed", popped);
        }
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn pop_on_empty_returns_none() {
        let queue = EventQueue::new();
        assert!(queue.pop().is_none());
        assert_eq!(queue.len(), 0);
        // A failed pop must not affect later operations.
        queue.push(event(Priority::High, 1));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn concurrent_pushes_keep_order_consistent() {
        let queue = Arc::new(EventQueue::new());
        let mut handles = Vec::new();
        for ix in 0..4 {
            let queue = queue.clone();
            handles.push(thread::spawn(move || {
                for marker in 0..100 {
                    let priority = if marker % 2 == 0 { Priority::High } else { Priority::Low };
                    queue.push(event(priority, ix * 100 + marker));
                }
            }));
        }
        for handle in handles {
            handle.join().expect("pusher panicked");
        }
        assert_eq!(queue.len(), 400);

        let mut last = Priority::High;
        let mut popped = 0;
        while let Some(event) = queue.pop() {
            assert!(event.priority <= last);
            last = event.priority;
            popped += 1;
        }
        assert_eq!(popped, 400);
    }
}
