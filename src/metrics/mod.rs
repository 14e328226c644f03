//! Metrics and observability module
//!
//! Counters describing the measurement plumbing, with an optional
//! Prometheus endpoint.
//!
//! Key metrics exposed:
//! - Lifecycle events recorded and ignored
//! - Upload successes, failures and durations per stream
//! - Workload metric submissions and connectivity probes

pub mod exporter;
pub mod recorder;

pub use exporter::{render_metrics, start_metrics_server, MetricsConfig, MetricsError};
pub use recorder::{init_metrics, UploadTimer};
