//! Queue tunables and the optional file/environment-backed wrapper around them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG_PATH: &str = "configs/taskq.toml";

/// Verbosity of the internal logger.
///
/// Maps onto [`tracing::Level`] in [`crate::telemetry::init_tracing`];
/// `Critical` collapses onto `ERROR` since `tracing` has no dedicated
/// critical level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Critical,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warning => tracing::Level::WARN,
            LogLevel::Critical => tracing::Level::ERROR,
        }
    }
}

/// Operational parameters for a single [`crate::QueueManager`].
///
/// Only `name` and `depth` are required; every other field has a
/// default and is set through the chained `with_*` builder methods.
///
/// # Examples
/// ```
/// use taskq::config::QueueConfig;
/// use std::time::Duration;
///
/// let config = QueueConfig::new("ingest", 10)
///     .with_timeout(Duration::from_secs(1))
///     .with_max_age(Duration::from_secs(30));
/// assert_eq!(config.depth, 10);
/// ```
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Human-readable label used in logs and metric labels.
    pub name: String,
    /// Maximum number of pending (not yet dispatched) tasks.
    pub depth: usize,
    /// Idle sleep between dispatcher poll iterations when nothing is
    /// eligible to run.
    pub delay: Duration,
    /// Upper bound on a task's time-in-system before it is dropped
    /// instead of dispatched.
    pub max_age: Duration,
    /// Wall-clock limit for a single command invocation.
    pub timeout: Duration,
    /// Verbosity of the internal logger.
    pub log_level: LogLevel,
}

impl QueueConfig {
    /// Start a config with the required fields and the defaults
    /// `delay = 50ms`, `max_age = 5s`, `timeout = 5s`, `log_level = Info`.
    pub fn new(name: impl Into<String>, depth: usize) -> Self {
        Self {
            name: name.into(),
            depth,
            delay: Duration::from_millis(50),
            max_age: Duration::from_secs(5),
            timeout: Duration::from_secs(5),
            log_level: LogLevel::Info,
        }
    }

    /// Override the idle poll interval.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Override the maximum time-in-system before a pending task is dropped.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Override the per-task execution timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the logger verbosity.
    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }
}

/// Millisecond/second-friendly on-disk and environment representation
/// of a [`QueueConfig`], for embedding applications that would rather
/// source tunables from `configs/taskq.toml` and `TASKQ__*` environment
/// variables than hand-write one in code.
///
/// The queue itself never reads files or the environment; only this
/// wrapper does, and only when an embedder asks for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub depth: usize,
    pub delay_ms: u64,
    pub max_age_secs: u64,
    pub timeout_secs: u64,
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "taskq".to_string(),
            depth: 100,
            delay_ms: 50,
            max_age_secs: 5,
            timeout_secs: 5,
            log_level: LogLevel::Info,
        }
    }
}

impl AppConfig {
    /// Load from `configs/taskq.toml` (if present) and `TASKQ__*` env vars.
    pub fn load() -> Result<Self> {
        Self::load_from_path(None::<PathBuf>)
    }

    /// Load from `configs/taskq.toml`, an optional additional path, and
    /// `TASKQ__*` env vars, in that order of increasing precedence.
    pub fn load_from_path<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut builder = ::config::Config::builder().add_source(
            ::config::File::from(PathBuf::from(DEFAULT_CONFIG_PATH))
                .format(::config::FileFormat::Toml)
                .required(false),
        );

        if let Some(path) = path {
            builder = builder.add_source(
                ::config::File::from(path.as_ref())
                    .format(::config::FileFormat::Toml)
                    .required(true),
            );
        }

        builder = builder.add_source(::config::Environment::with_prefix("TASKQ").separator("__"));

        builder
            .build()?
            .try_deserialize()
            .context("invalid taskq configuration")
    }

    /// Convert into the [`QueueConfig`] the queue itself consumes.
    pub fn to_queue_config(&self) -> QueueConfig {
        QueueConfig {
            name: self.name.clone(),
            depth: self.depth,
            delay: Duration::from_millis(self.delay_ms),
            max_age: Duration::from_secs(self.max_age_secs),
            timeout: Duration::from_secs(self.timeout_secs),
            log_level: self.log_level,
        }
    }
}
