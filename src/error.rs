//! Construction-time errors.
//!
//! Everything that can go wrong *after* a `QueueManager` is built is
//! reported through a task's callback (see [`crate::status::Status`]);
//! only misconfiguration at construction time surfaces as a real `Err`.

use thiserror::Error;

/// Reasons [`crate::QueueManager::new`] or
/// [`crate::QueueManager::with_callback`] can fail.
#[derive(Debug, Error)]
pub enum QueueError {
    /// `depth` was zero; a queue that can never hold a pending task is
    /// never useful and is almost always a typo.
    #[error("queue depth must be greater than zero")]
    ZeroDepth,

    /// `name` was empty; it is used verbatim in logs and metric labels.
    #[error("queue name must not be empty")]
    EmptyName,
}
