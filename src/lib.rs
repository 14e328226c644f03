//! Goodput monitoring for distributed training jobs
//!
//! - [`measurement`]: lifecycle events, recorder config and registry
//! - [`goodput`]: the goodput recorder and its periodic uploaders
//! - [`monitoring`]: workload performance/heartbeat reporting
//! - [`launch`]: runs a trainer bracketed by lifecycle events
//! - [`metrics`]: counters describing the plumbing itself

pub mod goodput;
pub mod launch;
pub mod measurement;
pub mod metrics;
pub mod monitoring;

pub use goodput::{GoodputRecorder, LedgerEngineFactory};
pub use launch::launch_trainer;
pub use measurement::{Event, EventArgs, Measurement, RecorderConfig, RecorderRegistry};
pub use monitoring::{MetricsBackendClient, WorkloadMonitor};
