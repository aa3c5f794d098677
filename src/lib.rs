//! `taskq` — a bounded, in-process asynchronous task queue.
//!
//! Work submissions (a command's arguments, plus an optional earliest
//! start time) are accepted into a depth-bounded pending store and run
//! one at a time, in order, on a dedicated background task. Each task
//! gets a wall-clock execution [`timeout`](config::QueueConfig::timeout)
//! and a maximum [`time-in-system`](config::QueueConfig::max_age); its
//! terminal [`Status`] and return value are handed to an optional
//! completion callback.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use taskq::config::QueueConfig;
//! use taskq::{CommandFuture, QueueManager};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let command: Arc<dyn Fn(u32) -> CommandFuture<bool> + Send + Sync> =
//!     Arc::new(|n: u32| -> CommandFuture<bool> { Box::pin(async move { Ok(n % 2 == 0) }) });
//!
//! let config = QueueConfig::new("parity-check", 16).with_timeout(Duration::from_secs(1));
//! let queue = QueueManager::new(config, command).unwrap();
//!
//! queue.add(4, None);
//! while queue.length() > 0 {
//!     tokio::time::sleep(Duration::from_millis(10)).await;
//! }
//! queue.shutdown();
//! queue.join().await;
//! # }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod status;
pub mod store;
pub mod task;
pub mod telemetry;

mod scheduler;

pub use error::QueueError;
pub use executor::{CommandFn, CommandFuture};
pub use scheduler::{CallbackFn, QueueManager};
pub use status::Status;
