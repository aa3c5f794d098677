//! The dispatcher loop and the `QueueManager` control surface built on
//! top of it.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::executor::{self, CommandFn, Outcome};
use crate::metrics;
use crate::status::Status;
use crate::store::PendingStore;
use crate::task::Task;

/// A completion sink: `(return_value, status, args)`, called once per
/// task outcome (including `QueueFull` and `MaxAge`).
pub type CallbackFn<T, R> = Arc<dyn Fn(Option<R>, Status, T) + Send + Sync>;

struct Shared<T, R> {
    config: QueueConfig,
    pending: Mutex<PendingStore<T>>,
    next_id: AtomicU64,
    in_flight: AtomicUsize,
    shutdown: CancellationToken,
    command: CommandFn<T, R>,
    callback: Option<CallbackFn<T, R>>,
}

impl<T, R> Shared<T, R> {
    fn deliver(&self, return_value: Option<R>, status: Status, args: T) {
        metrics::record_completed(&self.config.name, status);
        if let Some(callback) = &self.callback {
            let callback = Arc::clone(callback);
            let outcome = catch_unwind(AssertUnwindSafe(|| callback(return_value, status, args)));
            if outcome.is_err() {
                error!(queue = %self.config.name, "callback panicked; ignoring");
            }
        }
    }
}

/// A bounded, in-process asynchronous task queue.
///
/// Accepts work via [`QueueManager::add`], runs it one task at a time on
/// a dedicated background Tokio task, enforces a per-task execution
/// [`timeout`](QueueConfig::timeout) and a maximum
/// [`time-in-system`](QueueConfig::max_age), and optionally reports each
/// task's terminal [`Status`] to a callback.
///
/// Cloning a `QueueManager` is cheap and shares the same underlying
/// queue and dispatcher — it is an `Arc` handle, the same way the rest
/// of this workspace hands out shared service handles.
pub struct QueueManager<T, R> {
    shared: Arc<Shared<T, R>>,
    dispatcher: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl<T, R> Clone for QueueManager<T, R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl<T, R> QueueManager<T, R>
where
    T: Clone + Send + Sync + 'static,
    R: Send + Sync + 'static,
{
    /// Build a queue with no completion callback.
    pub fn new(config: QueueConfig, command: CommandFn<T, R>) -> Result<Self, QueueError> {
        Self::build(config, command, None)
    }

    /// Build a queue that reports every task outcome to `callback`.
    pub fn with_callback(
        config: QueueConfig,
        command: CommandFn<T, R>,
        callback: CallbackFn<T, R>,
    ) -> Result<Self, QueueError> {
        Self::build(config, command, Some(callback))
    }

    fn build(
        config: QueueConfig,
        command: CommandFn<T, R>,
        callback: Option<CallbackFn<T, R>>,
    ) -> Result<Self, QueueError> {
        if config.depth == 0 {
            return Err(QueueError::ZeroDepth);
        }
        if config.name.trim().is_empty() {
            return Err(QueueError::EmptyName);
        }

        let shared = Arc::new(Shared {
            pending: Mutex::new(PendingStore::new(config.depth)),
            next_id: AtomicU64::new(1),
            in_flight: AtomicUsize::new(0),
            shutdown: CancellationToken::new(),
            command,
            callback,
            config,
        });

        let handle = tokio::spawn(dispatch_loop(Arc::clone(&shared)));

        Ok(Self {
            shared,
            dispatcher: Arc::new(Mutex::new(Some(handle))),
        })
    }

    /// Submit `args` for execution, optionally not-before `run_after`.
    ///
    /// Returns `true` if the task was accepted into the pending store,
    /// `false` if it was rejected because the store is at `depth` (or
    /// the queue has been shut down). On rejection, a configured
    /// callback is delivered synchronously, on the caller's task.
    pub fn add(&self, args: T, run_after: Option<Instant>) -> bool {
        if self.shared.shutdown.is_cancelled() {
            self.reject(args);
            return false;
        }

        let id = self.shared.next_id.fetch_add(1, Ordering::SeqCst);
        let task = Task {
            id,
            args,
            created_at: Instant::now(),
            run_after,
        };

        let accepted = {
            let mut pending = self.shared.pending.lock().unwrap();
            pending.try_push(task)
        };

        match accepted {
            Ok(()) => {
                let depth = self.shared.pending.lock().unwrap().len();
                metrics::record_submitted(&self.shared.config.name);
                metrics::set_pending_depth(&self.shared.config.name, depth);
                debug!(queue = %self.shared.config.name, id, "task accepted");
                true
            }
            Err(task) => {
                warn!(queue = %self.shared.config.name, "queue full, rejecting submission");
                self.reject(task.args);
                false
            }
        }
    }

    fn reject(&self, args: T) {
        metrics::record_rejected(&self.shared.config.name);
        self.shared.deliver(None, Status::QueueFull, args);
    }

    /// Drop every pending task. The in-flight task, if any, runs to
    /// completion (or times out) as normal and still receives a callback.
    pub fn clear(&self) {
        self.shared.pending.lock().unwrap().clear();
        metrics::set_pending_depth(&self.shared.config.name, 0);
        info!(queue = %self.shared.config.name, "cleared pending tasks");
    }

    /// Count of pending tasks plus one if a task is currently in flight.
    pub fn length(&self) -> usize {
        let pending = self.shared.pending.lock().unwrap().len();
        pending + self.shared.in_flight.load(Ordering::SeqCst)
    }

    /// Signal the dispatcher to stop after its current iteration. The
    /// in-flight task, if any, is left to finish or time out normally.
    pub fn shutdown(&self) {
        self.shared.shutdown.cancel();
        info!(queue = %self.shared.config.name, "shutdown requested");
    }

    /// Wait for the dispatcher task to actually exit after [`shutdown`](Self::shutdown).
    ///
    /// Useful in tests and graceful-shutdown paths that want to know the
    /// background task is gone, not just that the stop flag is set.
    pub async fn join(&self) {
        let handle = self.dispatcher.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

async fn dispatch_loop<T, R>(shared: Arc<Shared<T, R>>)
where
    T: Clone + Send + Sync + 'static,
    R: Send + Sync + 'static,
{
    let name = shared.config.name.clone();
    info!(queue = %name, "dispatcher started");

    loop {
        if shared.shutdown.is_cancelled() {
            break;
        }

        let selected = {
            let mut pending = shared.pending.lock().unwrap();
            pending.pop_eligible(Instant::now())
        };

        let task = match selected {
            Some(task) => task,
            None => {
                sleep_or_shutdown(&shared).await;
                continue;
            }
        };

        metrics::set_pending_depth(&name, shared.pending.lock().unwrap().len());

        if task.is_aged_out(Instant::now(), shared.config.max_age) {
            warn!(queue = %name, id = task.id, "task aged out before dispatch");
            shared.deliver(None, Status::MaxAge, task.args);
            continue;
        }

        shared.in_flight.store(1, Ordering::SeqCst);
        debug!(queue = %name, id = task.id, "dispatching task");

        let callback_args = task.args.clone();
        let outcome = executor::supervise(
            Arc::clone(&shared.command),
            task.args,
            shared.config.timeout,
        )
        .await;

        shared.in_flight.store(0, Ordering::SeqCst);

        match outcome {
            Outcome::Completed(value) => {
                debug!(queue = %name, id = task.id, "task completed");
                shared.deliver(Some(value), Status::Ok, callback_args);
            }
            Outcome::Failed(error) => {
                error!(queue = %name, id = task.id, %error, "task failed");
                shared.deliver(None, Status::Exception, callback_args);
            }
            Outcome::TimedOut => {
                warn!(queue = %name, id = task.id, "task timed out");
                shared.deliver(None, Status::Timeout, callback_args);
            }
        }

        sleep_or_shutdown(&shared).await;
    }

    info!(queue = %name, "dispatcher stopped");
}

async fn sleep_or_shutdown<T, R>(shared: &Arc<Shared<T, R>>) {
    tokio::select! {
        _ = tokio::time::sleep(shared.config.delay) => {}
        _ = shared.shutdown.cancelled() => {}
    }
}
