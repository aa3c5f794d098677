//! Process-wide logger initialization.
//!
//! The queue never constructs its own subscriber implicitly; an
//! embedding application calls [`init_tracing`] once, early, the same
//! way it would wire up any other `tracing-subscriber` based service.

use tracing_subscriber::EnvFilter;

use crate::config::LogLevel;

/// Install a `tracing-subscriber` `fmt` subscriber at the given
/// [`LogLevel`] as the process-wide default.
///
/// Safe to call more than once; subsequent calls are no-ops (mirrors
/// `tracing_subscriber::fmt().try_init()` semantics).
pub fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing::Level::from(level).to_string()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
