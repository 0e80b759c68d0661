//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; the binary installs a Prometheus
//! exporter when one is configured, otherwise recording is a no-op.

use std::net::SocketAddr;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::{PipelineError, PipelineResult};

/// Install the Prometheus recorder with a scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> PipelineResult<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| PipelineError::config(format!("failed to install metrics exporter: {}", e)))
}

/// Metric names as constants for consistency.
pub mod names {
    pub const RUNS_TOTAL: &str = "vscore_runs_total";
    pub const RUN_DURATION_SECONDS: &str = "vscore_run_duration_seconds";
    pub const STAGE_DURATION_SECONDS: &str = "vscore_stage_duration_seconds";
    pub const RETRIES_TOTAL: &str = "vscore_retries_total";
    pub const DEGRADED_TOTAL: &str = "vscore_degraded_total";
    pub const SIGNALS_TOTAL: &str = "vscore_signals_total";
    pub const CLEANUP_FAILURES_TOTAL: &str = "vscore_cleanup_failures_total";
}

/// Record a finished run. `outcome` is `complete`, `degraded` or an error kind.
pub fn record_run(outcome: &str, duration_secs: f64) {
    counter!(names::RUNS_TOTAL, "outcome" => outcome.to_string()).increment(1);
    histogram!(names::RUN_DURATION_SECONDS).record(duration_secs);
}

pub fn record_stage(stage: &'static str, duration_secs: f64) {
    histogram!(names::STAGE_DURATION_SECONDS, "stage" => stage).record(duration_secs);
}

pub fn record_retry(operation: &str, class: &'static str) {
    counter!(
        names::RETRIES_TOTAL,
        "operation" => operation.to_string(),
        "class" => class
    )
    .increment(1);
}

pub fn record_degraded(reason: &'static str) {
    counter!(names::DEGRADED_TOTAL, "reason" => reason).increment(1);
}

pub fn record_signal(kind: &'static str) {
    counter!(names::SIGNALS_TOTAL, "kind" => kind).increment(1);
}

pub fn record_cleanup_failure(target: &'static str) {
    counter!(names::CLEANUP_FAILURES_TOTAL, "target" => target).increment(1);
}
