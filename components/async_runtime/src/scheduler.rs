//! The "run later" capability deferreds settle through.

use crate::task_queue::Task;

/// Defers a task to a later turn.
///
/// Implementations must run tasks deferred from the same turn in the order
/// they were deferred. No ordering is promised relative to other kinds of
/// host work.
pub trait Scheduler {
    /// Schedules `task` to run after the current turn.
    fn defer(&self, task: Task);
}
