//! Interface to the goodput computation engine
//!
//! The recorder only talks to the engine through these traits, so a
//! different engine can be swapped in through an [`EngineFactory`].

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Timestamp sink for lifecycle milestones. `None` means "now".
pub trait GoodputEngine: Send + Sync {
    fn record_job_start_time(&self, at: Option<DateTime<Utc>>);
    fn record_job_end_time(&self, at: Option<DateTime<Utc>>);
    fn record_step_start_time(&self, step: u64, at: Option<DateTime<Utc>>);
    fn record_accelerator_init_start_time(&self, at: Option<DateTime<Utc>>);
    fn record_accelerator_init_end_time(&self, at: Option<DateTime<Utc>>);
    fn record_training_preparation_start_time(&self, at: Option<DateTime<Utc>>);
    fn record_training_preparation_end_time(&self, at: Option<DateTime<Utc>>);
    fn record_data_loading_start_time(&self, at: Option<DateTime<Utc>>);
    fn record_data_loading_end_time(&self, at: Option<DateTime<Utc>>);
}

/// Background uploaders owned by the engine.
///
/// Starting returns immediately; the uploaders run until the process exits
/// and handle their own failures.
pub trait GoodputMonitorHandle: Send + Sync {
    fn start_goodput_uploader(&self);
    fn start_step_deviation_uploader(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub job_name: String,
    pub logger_name: String,
    /// Only the coordinator process writes records
    pub logging_enabled: bool,
}

/// Whether uploads are also pushed to the cloud monitoring sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcpOptions {
    pub enable_gcp_goodput_metrics: bool,
    pub enable_gcp_step_deviation_metrics: bool,
}

impl Default for GcpOptions {
    fn default() -> Self {
        Self {
            enable_gcp_goodput_metrics: true,
            enable_gcp_step_deviation_metrics: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorOptions {
    pub job_name: String,
    pub logger_name: String,
    pub upload_dir: PathBuf,
    pub upload_interval: Duration,
    pub monitoring_enabled: bool,
    pub include_badput_breakdown: bool,
    pub include_step_deviation: bool,
    pub step_deviation_interval: Duration,
    pub gcp_options: GcpOptions,
}

/// Builds engine and monitor handles.
pub trait EngineFactory: Send + Sync {
    fn create_engine(&self, options: &EngineOptions) -> Arc<dyn GoodputEngine>;
    fn create_monitor(&self, options: &MonitorOptions) -> Arc<dyn GoodputMonitorHandle>;
}

/// Logger name the engine and monitor share for a job.
pub fn logger_name(job_name: &str) -> String {
    format!("goodput_logger_{job_name}")
}
