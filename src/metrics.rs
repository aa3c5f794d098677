//! Queue instrumentation via the `metrics` facade.
//!
//! No exporter is installed here; an embedding application wires one up
//! (e.g. `metrics-exporter-prometheus`) the same way it would for any
//! other `metrics`-instrumented component. These functions are cheap
//! no-ops when no recorder has been installed.

use metrics::{counter, gauge};

use crate::status::Status;

/// Record an accepted submission.
pub fn record_submitted(queue_name: &str) {
    counter!("taskq_submitted_total", "queue" => queue_name.to_string()).increment(1);
}

/// Record a submission rejected for being over `depth`.
pub fn record_rejected(queue_name: &str) {
    counter!("taskq_rejected_total", "queue" => queue_name.to_string()).increment(1);
}

/// Record a task reaching a terminal status.
pub fn record_completed(queue_name: &str, status: Status) {
    counter!(
        "taskq_completed_total",
        "queue" => queue_name.to_string(),
        "status" => status.label(),
    )
    .increment(1);
}

/// Publish the current pending-store depth.
pub fn set_pending_depth(queue_name: &str, depth: usize) {
    gauge!("taskq_pending_depth", "queue" => queue_name.to_string()).set(depth as f64);
}
