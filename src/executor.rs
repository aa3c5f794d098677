//! Execution supervisor: runs one command invocation under a timeout,
//! distinguishing a natural return, a thrown error, and a timeout.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::warn;

/// A boxed, owned future, the shape a command invocation returns.
pub type CommandFuture<R> = Pin<Box<dyn Future<Output = anyhow::Result<R>> + Send>>;

/// A command callable: takes the task's args, returns a future resolving
/// to the task's result or an error.
pub type CommandFn<T, R> = std::sync::Arc<dyn Fn(T) -> CommandFuture<R> + Send + Sync>;

/// The three distinguishable outcomes of one supervised invocation.
pub enum Outcome<R> {
    /// The command returned `Ok(value)` before the timeout elapsed.
    Completed(R),
    /// The command returned `Err`, or panicked.
    Failed(anyhow::Error),
    /// The command did not finish within the timeout; it has been
    /// abandoned and may still be running in the background.
    TimedOut,
}

/// Run `command(args)` on its own Tokio task and race it against `timeout`.
///
/// On timeout, the `JoinHandle` is dropped without awaiting it further.
/// Dropping a `JoinHandle` does not cancel the task it refers to: the
/// spawned command keeps running, detached, until it finishes on its
/// own. That is the intended "abandon, don't block" behavior — the
/// dispatcher must never wait on a runaway command.
pub async fn supervise<T, R>(command: CommandFn<T, R>, args: T, timeout: Duration) -> Outcome<R>
where
    T: Send + 'static,
    R: Send + 'static,
{
    let handle = tokio::spawn(async move { command(args).await });

    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(Ok(value))) => Outcome::Completed(value),
        Ok(Ok(Err(error))) => Outcome::Failed(error),
        Ok(Err(join_error)) => Outcome::Failed(anyhow::anyhow!("command panicked: {join_error}")),
        Err(_elapsed) => {
            warn!("command exceeded timeout of {timeout:?}; abandoning it");
            Outcome::TimedOut
        }
    }
}
