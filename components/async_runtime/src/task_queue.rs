//! Task queue management.
//!
//! This module provides the timer-ordered task queue used by the event loop.
//! Tasks are executed one at a time in order of their due time; tasks due at
//! the same instant run in the order they were enqueued.

use crate::error::RuntimeResult;
use std::collections::BTreeMap;
use std::time::Duration;

/// A task to be executed by the event loop.
///
/// Tasks represent work to be done in a later turn of the event loop, such as
/// a deferred settlement or a timer callback. Tasks are not `Send`: they run
/// on the thread that owns the loop.
pub struct Task {
    callback: Box<dyn FnOnce() -> RuntimeResult<()>>,
}

impl Task {
    /// Creates a new Task from a closure.
    ///
    /// # Arguments
    ///
    /// * `f` - The function to execute when the task runs
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> RuntimeResult<()> + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Executes the task.
    pub fn run(self) -> RuntimeResult<()> {
        (self.callback)()
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Task {{ ... }}")
    }
}

/// Handle to a task scheduled with a delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// A queue of tasks keyed by due time.
///
/// Ordering is by (due time, insertion sequence), which keeps FIFO order
/// among tasks due at the same instant.
#[derive(Debug, Default)]
pub struct TaskQueue {
    queue: BTreeMap<(Duration, u64), Task>,
    next_seq: u64,
}

impl TaskQueue {
    /// Creates a new empty TaskQueue.
    pub fn new() -> Self {
        Self {
            queue: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Adds a task due at `due`.
    pub fn enqueue(&mut self, due: Duration, task: Task) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.insert((due, seq), task);
        TimerId(seq)
    }

    /// Removes and returns the earliest task together with its due time.
    pub fn dequeue(&mut self) -> Option<(Duration, Task)> {
        self.queue.pop_first().map(|((due, _), task)| (due, task))
    }

    /// Removes and returns the earliest task if it is due at or before `deadline`.
    pub fn dequeue_due(&mut self, deadline: Duration) -> Option<(Duration, Task)> {
        match self.peek_due() {
            Some(due) if due <= deadline => self.dequeue(),
            _ => None,
        }
    }

    /// Returns the due time of the earliest task.
    pub fn peek_due(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    /// Removes the task with the given id. Returns false if it already ran.
    pub fn remove(&mut self, id: TimerId) -> bool {
        let key = self.queue.keys().find(|(_, seq)| *seq == id.0).copied();
        match key {
            Some(key) => self.queue.remove(&key).is_some(),
            None => false,
        }
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the number of tasks in the queue.
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}
