//! Event loop implementation.
//!
//! This module provides the single-threaded event loop deferreds settle on.
//! Time is virtual: the clock jumps to each task's due time when the task
//! runs, so delayed work executes without sleeping.

use crate::config::EventLoopConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::scheduler::Scheduler;
use crate::task_queue::{Task, TaskQueue, TimerId};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

thread_local! {
    static CURRENT: EventLoop = EventLoop::new();
}

/// The event loop.
///
/// Each turn takes the earliest due task from the queue, advances the virtual
/// clock to its due time and runs it. `EventLoop` is a cheap handle: clones
/// share the same queue and clock, so tasks may schedule further work while
/// the loop is running.
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, Task};
/// use std::time::Duration;
///
/// let event_loop = EventLoop::new();
/// event_loop.set_timeout(Duration::from_millis(5), Task::new(|| Ok(())));
/// event_loop.run_until_done().unwrap();
/// assert_eq!(event_loop.now(), Duration::from_millis(5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventLoop {
    inner: Rc<LoopInner>,
}

#[derive(Debug, Default)]
struct LoopInner {
    config: EventLoopConfig,
    tasks: RefCell<TaskQueue>,
    now: Cell<Duration>,
}

impl EventLoop {
    /// Creates a new EventLoop with an empty queue and the default config.
    pub fn new() -> Self {
        Self::with_config(EventLoopConfig::default())
    }

    /// Creates a new EventLoop with the given config.
    pub fn with_config(config: EventLoopConfig) -> Self {
        Self {
            inner: Rc::new(LoopInner {
                config,
                tasks: RefCell::new(TaskQueue::new()),
                now: Cell::new(Duration::ZERO),
            }),
        }
    }

    /// Returns the current thread's default event loop.
    ///
    /// `Deferred::new` schedules onto this loop.
    pub fn current() -> Self {
        CURRENT.with(Clone::clone)
    }

    /// Returns the loop's configuration.
    pub fn config(&self) -> &EventLoopConfig {
        &self.inner.config
    }

    /// Returns the current virtual time.
    pub fn now(&self) -> Duration {
        self.inner.now.get()
    }

    /// Adds a task due immediately. It runs after every task already due.
    pub fn enqueue_task(&self, task: Task) -> TimerId {
        self.set_timeout(Duration::ZERO, task)
    }

    /// Adds a task due `delay` after the current virtual time.
    pub fn set_timeout(&self, delay: Duration, task: Task) -> TimerId {
        let due = self.now() + delay;
        let id = self.inner.tasks.borrow_mut().enqueue(due, task);
        tracing::trace!(timer = id.0, ?due, "task scheduled");
        id
    }

    /// Removes a scheduled task. Returns false if it already ran.
    pub fn clear_timeout(&self, id: TimerId) -> bool {
        self.inner.tasks.borrow_mut().remove(id)
    }

    /// Returns the number of tasks waiting to run.
    pub fn pending_tasks(&self) -> usize {
        self.inner.tasks.borrow().len()
    }

    /// Returns true if no task is waiting to run.
    pub fn is_idle(&self) -> bool {
        self.inner.tasks.borrow().is_empty()
    }

    /// Runs the earliest task, if any.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if a task ran, `Ok(false)` if the queue was empty.
    pub fn run_one(&self) -> RuntimeResult<bool> {
        let next = self.inner.tasks.borrow_mut().dequeue();
        self.run_entry(next)
    }

    /// Runs tasks until the queue is empty.
    ///
    /// # Returns
    ///
    /// `Ok(())` once idle, or the first error a task returned. Fails with
    /// `TurnLimitExceeded` if the configured turn limit is reached first.
    pub fn run_until_done(&self) -> RuntimeResult<()> {
        self.run_turns(None)
    }

    /// Runs every task due within `duration` from now, then moves the clock
    /// to that instant.
    pub fn run_for(&self, duration: Duration) -> RuntimeResult<()> {
        let deadline = self.now() + duration;
        self.run_turns(Some(deadline))?;
        self.advance_to(deadline);
        Ok(())
    }

    fn run_turns(&self, deadline: Option<Duration>) -> RuntimeResult<()> {
        let mut turns = 0usize;
        loop {
            let next = {
                let mut tasks = self.inner.tasks.borrow_mut();
                match deadline {
                    Some(deadline) => tasks.dequeue_due(deadline),
                    None => tasks.dequeue(),
                }
            };
            if !self.run_entry(next)? {
                return Ok(());
            }
            turns += 1;
            if let Some(limit) = self.inner.config.max_turns {
                if turns >= limit && self.has_due(deadline) {
                    tracing::warn!(limit, pending = self.pending_tasks(), "turn limit exceeded");
                    return Err(RuntimeError::TurnLimitExceeded { limit });
                }
            }
        }
    }

    /// Returns true if a task is due within `deadline` (any task when `None`).
    fn has_due(&self, deadline: Option<Duration>) -> bool {
        match (self.inner.tasks.borrow().peek_due(), deadline) {
            (Some(due), Some(deadline)) => due <= deadline,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    fn run_entry(&self, entry: Option<(Duration, Task)>) -> RuntimeResult<bool> {
        // The queue borrow is released before the task runs.
        match entry {
            Some((due, task)) => {
                self.advance_to(due);
                tracing::trace!(now = ?self.now(), "running task");
                task.run()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn advance_to(&self, instant: Duration) {
        if instant > self.inner.now.get() {
            self.inner.now.set(instant);
        }
    }
}

impl Scheduler for EventLoop {
    fn defer(&self, task: Task) {
        self.enqueue_task(task);
    }
}
