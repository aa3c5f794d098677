//! The bounded, insertion-ordered pending store.

use std::collections::VecDeque;
use std::time::Instant;

use crate::task::Task;

/// FIFO store of accepted, not-yet-dispatched tasks, bounded by `depth`.
///
/// Dispatch eligibility is filtered by `run_after`: [`PendingStore::pop_eligible`]
/// removes the *first* (earliest-inserted) task whose `run_after` has
/// already arrived, which is not necessarily the task at the front of
/// the deque.
pub struct PendingStore<T> {
    depth: usize,
    tasks: VecDeque<Task<T>>,
}

impl<T> PendingStore<T> {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            tasks: VecDeque::new(),
        }
    }

    /// Append `task` if the store has room. Returns the task back,
    /// unmodified, if the store is already at `depth`.
    pub fn try_push(&mut self, task: Task<T>) -> Result<(), Task<T>> {
        if self.tasks.len() >= self.depth {
            return Err(task);
        }
        self.tasks.push_back(task);
        Ok(())
    }

    /// Remove and return the earliest-inserted eligible task, if any.
    pub fn pop_eligible(&mut self, now: Instant) -> Option<Task<T>> {
        let index = self.tasks.iter().position(|t| t.is_eligible(now))?;
        self.tasks.remove(index)
    }

    /// Drop every pending task without running it or notifying anyone.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
