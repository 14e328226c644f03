use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two independently scheduled upload streams.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UploadStream {
    Goodput,
    StepDeviation,
}

impl UploadStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStream::Goodput => "goodput",
            UploadStream::StepDeviation => "step_deviation",
        }
    }

    /// File the JSON-lines sink appends this stream to
    pub fn file_name(&self) -> &'static str {
        match self {
            UploadStream::Goodput => "goodput.jsonl",
            UploadStream::StepDeviation => "step_deviation.jsonl",
        }
    }
}

impl fmt::Display for UploadStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time lost to each kind of overhead, as percent of elapsed job time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct BadputBreakdown {
    pub accelerator_init_percent: f64,
    pub training_prep_percent: f64,
    pub data_loading_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoodputSnapshot {
    pub job_name: String,
    pub captured_at: DateTime<Utc>,
    pub job_started_at: DateTime<Utc>,
    pub job_ended: bool,
    pub last_step: Option<u64>,
    pub elapsed_secs: f64,
    pub productive_secs: f64,
    pub goodput_percent: f64,
    pub badput: Option<BadputBreakdown>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepDeviationSnapshot {
    pub job_name: String,
    pub captured_at: DateTime<Utc>,
    pub last_step: Option<u64>,
    /// Number of step intervals the statistics cover
    pub intervals: u64,
    pub mean_step_secs: f64,
    pub std_dev_secs: f64,
    /// Largest distance of any interval from the mean
    pub max_deviation_secs: f64,
}

/// One upload's payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "stream", rename_all = "snake_case")]
pub enum UploadRecord {
    Goodput(GoodputSnapshot),
    StepDeviation(StepDeviationSnapshot),
}

impl UploadRecord {
    pub fn stream(&self) -> UploadStream {
        match self {
            UploadRecord::Goodput(_) => UploadStream::Goodput,
            UploadRecord::StepDeviation(_) => UploadStream::StepDeviation,
        }
    }

    pub fn job_name(&self) -> &str {
        match self {
            UploadRecord::Goodput(s) => &s.job_name,
            UploadRecord::StepDeviation(s) => &s.job_name,
        }
    }
}
