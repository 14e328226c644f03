//! Recorder configuration
//!
//! A [`RecorderConfig`] is built either from `key=value` spec strings (the
//! `--recorder_spec` flag form) or from JSON, and is validated before any
//! recorder is constructed from it.

use crate::measurement::error::{MeasurementError, MeasurementResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_STEP_DEVIATION_INTERVAL_SECS: u64 = 30;

/// Configuration for a goodput recorder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecorderConfig {
    /// Job name, used to key everything the recorder writes
    pub name: String,

    /// Directory the monitor stores uploaded metrics in
    pub upload_dir: PathBuf,

    /// Seconds between goodput uploads
    pub upload_interval: u64,

    /// Whether step deviation metrics are uploaded too
    #[serde(default = "default_true")]
    pub include_step_deviation: bool,

    /// Seconds between step deviation uploads
    #[serde(default = "default_step_deviation_interval")]
    pub step_deviation_interval_seconds: u64,

    /// Push goodput metrics to the cloud monitoring sink
    #[serde(default = "default_true")]
    pub enable_gcp_goodput_metrics: bool,

    /// Push step deviation metrics to the cloud monitoring sink
    #[serde(default = "default_true")]
    pub enable_gcp_step_deviation_metrics: bool,
}

fn default_true() -> bool {
    true
}

fn default_step_deviation_interval() -> u64 {
    DEFAULT_STEP_DEVIATION_INTERVAL_SECS
}

impl RecorderConfig {
    /// Config with the required fields set and everything else defaulted.
    pub fn new(name: impl Into<String>, upload_dir: impl Into<PathBuf>, upload_interval: u64) -> Self {
        Self {
            name: name.into(),
            upload_dir: upload_dir.into(),
            upload_interval,
            include_step_deviation: true,
            step_deviation_interval_seconds: DEFAULT_STEP_DEVIATION_INTERVAL_SECS,
            enable_gcp_goodput_metrics: true,
            enable_gcp_step_deviation_metrics: true,
        }
    }

    /// Parse a list of `key=value` pairs.
    ///
    /// Later pairs override earlier ones. Unknown keys are logged and
    /// skipped; pairs without a `=` and values that don't parse are rejected.
    pub fn from_spec<S: AsRef<str>>(spec: &[S]) -> MeasurementResult<Self> {
        let mut name = None;
        let mut upload_dir = None;
        let mut upload_interval = None;
        let mut include_step_deviation = true;
        let mut step_deviation_interval_seconds = DEFAULT_STEP_DEVIATION_INTERVAL_SECS;
        let mut enable_gcp_goodput_metrics = true;
        let mut enable_gcp_step_deviation_metrics = true;

        for pair in spec {
            let pair = pair.as_ref();
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                MeasurementError::ConfigValidation(format!("expected key=value, got {pair:?}"))
            })?;
            let value = value.trim();

            match key.trim() {
                "name" => name = Some(value.to_string()),
                "upload_dir" => upload_dir = Some(PathBuf::from(value)),
                "upload_interval" => upload_interval = Some(parse_u64(key, value)?),
                "include_step_deviation" => include_step_deviation = parse_bool(key, value)?,
                "step_deviation_interval_seconds" => {
                    step_deviation_interval_seconds = parse_u64(key, value)?
                }
                "enable_gcp_goodput_metrics" => enable_gcp_goodput_metrics = parse_bool(key, value)?,
                "enable_gcp_step_deviation_metrics" => {
                    enable_gcp_step_deviation_metrics = parse_bool(key, value)?
                }
                other => tracing::warn!(key = other, "Ignoring unknown recorder_spec key"),
            }
        }

        let config = Self {
            name: name.ok_or_else(|| missing("name"))?,
            upload_dir: upload_dir.ok_or_else(|| missing("upload_dir"))?,
            upload_interval: upload_interval.ok_or_else(|| missing("upload_interval"))?,
            include_step_deviation,
            step_deviation_interval_seconds,
            enable_gcp_goodput_metrics,
            enable_gcp_step_deviation_metrics,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> MeasurementResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MeasurementResult<()> {
        if self.name.trim().is_empty() {
            return Err(MeasurementError::ConfigValidation("name must not be empty".into()));
        }
        if self.upload_dir.as_os_str().is_empty() {
            return Err(MeasurementError::ConfigValidation(
                "upload_dir must not be empty".into(),
            ));
        }
        if self.upload_interval == 0 {
            return Err(MeasurementError::ConfigValidation(
                "upload_interval must be positive".into(),
            ));
        }
        if self.include_step_deviation && self.step_deviation_interval_seconds == 0 {
            return Err(MeasurementError::ConfigValidation(
                "step_deviation_interval_seconds must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn upload_period(&self) -> Duration {
        Duration::from_secs(self.upload_interval)
    }

    pub fn step_deviation_period(&self) -> Duration {
        Duration::from_secs(self.step_deviation_interval_seconds)
    }
}

fn missing(field: &str) -> MeasurementError {
    MeasurementError::ConfigValidation(format!("missing required field: {field}"))
}

fn parse_u64(key: &str, value: &str) -> MeasurementResult<u64> {
    value.parse().map_err(|_| {
        MeasurementError::ConfigValidation(format!("{key} expects an integer, got {value:?}"))
    })
}

fn parse_bool(key: &str, value: &str) -> MeasurementResult<bool> {
    match value {
        "true" | "True" | "TRUE" | "1" => Ok(true),
        "false" | "False" | "FALSE" | "0" => Ok(false),
        _ => Err(MeasurementError::ConfigValidation(format!(
            "{key} expects a boolean, got {value:?}"
        ))),
    }
}
