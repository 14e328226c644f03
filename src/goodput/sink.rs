//! Upload destinations
//!
//! Each upload tick hands one [`UploadRecord`] to every destination
//! configured for its stream.

use crate::goodput::error::UploadResult;
use crate::goodput::types::{UploadRecord, UploadStream};
use crate::monitoring::{MetricPoint, MetricValue, MetricsBackendClient, WorkloadIdentity};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

pub const GOODPUT_METRIC_TYPE: &str = "workload.googleapis.com/goodput/goodput_percent";
pub const BADPUT_METRIC_TYPE: &str = "workload.googleapis.com/goodput/badput_percent";
pub const STEP_DEVIATION_METRIC_TYPE: &str =
    "workload.googleapis.com/goodput/step_deviation_seconds";

#[async_trait]
pub trait UploadDestination: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    async fn upload(&self, record: &UploadRecord) -> UploadResult<()>;
}

/// Appends records as JSON lines under the upload directory, one file per stream.
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    dir: PathBuf,
}

impl JsonLinesSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, stream: UploadStream) -> PathBuf {
        self.dir.join(stream.file_name())
    }
}

#[async_trait]
impl UploadDestination for JsonLinesSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn upload(&self, record: &UploadRecord) -> UploadResult<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        tokio::fs::create_dir_all(&self.dir).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(record.stream()))
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Pushes records to the cloud monitoring backend as time series.
#[derive(Debug, Clone)]
pub struct BackendSink {
    client: MetricsBackendClient,
    identity: WorkloadIdentity,
}

impl BackendSink {
    pub fn new(client: MetricsBackendClient, identity: WorkloadIdentity) -> Self {
        Self { client, identity }
    }

    /// Points describing one record
    pub fn points_for(&self, record: &UploadRecord) -> Vec<MetricPoint> {
        let resource = self.identity.resource();
        let point = |metric_type: &str, value: f64| {
            MetricPoint::new(metric_type, MetricValue::Double(value), resource.clone())
                .with_label("job_name", record.job_name())
        };

        match record {
            UploadRecord::Goodput(snapshot) => {
                let mut points = vec![point(GOODPUT_METRIC_TYPE, snapshot.goodput_percent)
                    .at(snapshot.captured_at)];
                if let Some(badput) = &snapshot.badput {
                    for (badput_type, value) in [
                        ("accelerator_initialization", badput.accelerator_init_percent),
                        ("training_prep", badput.training_prep_percent),
                        ("data_loading", badput.data_loading_percent),
                    ] {
                        points.push(
                            point(BADPUT_METRIC_TYPE, value)
                                .with_label("badput_type", badput_type)
                                .at(snapshot.captured_at),
                        );
                    }
                }
                points
            }
            UploadRecord::StepDeviation(snapshot) => {
                vec![point(STEP_DEVIATION_METRIC_TYPE, snapshot.max_deviation_secs)
                    .at(snapshot.captured_at)]
            }
        }
    }
}

#[async_trait]
impl UploadDestination for BackendSink {
    fn name(&self) -> &str {
        "cloud_monitoring"
    }

    async fn upload(&self, record: &UploadRecord) -> UploadResult<()> {
        let points = self.points_for(record);
        self.client.create_time_series_batch(&points).await?;
        Ok(())
    }
}
