//! Terminal status taxonomy delivered to a task's completion callback.

use std::fmt;

/// The complete set of outcomes a task can resolve to.
///
/// Exactly one of these is ever handed to a configured callback per
/// accepted submission (or per rejected one, in the `QueueFull` case).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The command returned without error inside its timeout.
    Ok,
    /// The pending store was at capacity when the task was submitted.
    QueueFull,
    /// The command did not return within the configured timeout.
    Timeout,
    /// The command returned an error, or panicked.
    Exception,
    /// The task waited longer than `max_age` before it could be dispatched.
    MaxAge,
}

impl Status {
    /// Short label used in metric names and log fields.
    pub fn label(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::QueueFull => "queue_full",
            Status::Timeout => "timeout",
            Status::Exception => "exception",
            Status::MaxAge => "max_age",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
