//! Metrics recorder for the measurement plumbing itself
//!
//! Counts what the recorder, uploaders and workload monitor did, so an
//! operator can tell a quiet backend from a broken pipeline.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize metric descriptions (call once at startup)
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return; // Already initialized
    }

    // Lifecycle events
    describe_counter!(
        "goodput_events_recorded_total",
        "Lifecycle events forwarded to the goodput engine"
    );
    describe_counter!(
        "goodput_unknown_events_total",
        "Events ignored because their kind is unknown"
    );

    // Uploads
    describe_counter!("goodput_uploads_total", "Successful metric uploads");
    describe_counter!(
        "goodput_upload_failures_total",
        "Upload attempts that failed and were skipped"
    );
    describe_histogram!(
        "goodput_upload_duration_seconds",
        "Time spent querying and uploading one snapshot"
    );

    // Workload monitor
    describe_counter!(
        "workload_metric_submissions_total",
        "Workload metrics accepted by the backend"
    );
    describe_counter!(
        "workload_metric_failures_total",
        "Workload metrics dropped after a backend failure"
    );
    describe_counter!(
        "workload_connectivity_checks_total",
        "Connectivity probes against the metrics backend"
    );
}

// ============== Lifecycle Events ==============

/// Record an event reaching the engine
pub fn record_event_recorded(event: &'static str) {
    counter!("goodput_events_recorded_total", "event" => event).increment(1);
}

/// Record an event being dropped as unknown
pub fn record_unknown_event() {
    counter!("goodput_unknown_events_total").increment(1);
}

// ============== Uploads ==============

pub fn record_upload(stream: &'static str) {
    counter!("goodput_uploads_total", "stream" => stream).increment(1);
}

pub fn record_upload_failed(stream: &'static str) {
    counter!("goodput_upload_failures_total", "stream" => stream).increment(1);
}

// ============== Workload Monitor ==============

pub fn record_workload_metric_sent(kind: &str) {
    counter!("workload_metric_submissions_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_workload_metric_failed(kind: &str) {
    counter!("workload_metric_failures_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_connectivity_check(reachable: bool) {
    let outcome = if reachable { "ok" } else { "error" };
    counter!("workload_connectivity_checks_total", "outcome" => outcome).increment(1);
}

/// Times one upload tick and records the duration
pub struct UploadTimer {
    stream: &'static str,
    start_time: Instant,
}

impl UploadTimer {
    pub fn start(stream: &'static str) -> Self {
        Self {
            stream,
            start_time: Instant::now(),
        }
    }

    /// Stop timing and record the duration
    pub fn stop(self) {
        histogram!("goodput_upload_duration_seconds", "stream" => self.stream)
            .record(self.start_time.elapsed().as_secs_f64());
    }
}
