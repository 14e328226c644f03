//! Periodic upload loops
//!
//! An [`UploadLoop`] sleeps for one period, asks its [`SnapshotSource`] for
//! the current record and hands it to each destination, forever. Every
//! failure is logged and the loop carries on with the next tick.

use crate::goodput::error::{UploadError, UploadResult};
use crate::goodput::sink::UploadDestination;
use crate::goodput::types::{UploadRecord, UploadStream};
use crate::metrics::recorder::{record_upload, record_upload_failed, UploadTimer};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Produces the record to upload for a stream.
pub trait SnapshotSource: Send + Sync {
    fn snapshot(&self, stream: UploadStream) -> UploadResult<UploadRecord>;
}

/// Outcome of one tick, mostly for tests and debug logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub delivered: usize,
    pub failed: usize,
    pub skipped: bool,
}

#[derive(Clone)]
pub struct UploadLoop {
    stream: UploadStream,
    period: Duration,
    source: Arc<dyn SnapshotSource>,
    destinations: Vec<Arc<dyn UploadDestination>>,
}

impl UploadLoop {
    pub fn new(
        stream: UploadStream,
        period: Duration,
        source: Arc<dyn SnapshotSource>,
        destinations: Vec<Arc<dyn UploadDestination>>,
    ) -> Self {
        Self {
            stream,
            period,
            source,
            destinations,
        }
    }

    pub fn stream(&self) -> UploadStream {
        self.stream
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn destination_count(&self) -> usize {
        self.destinations.len()
    }

    /// Query once and push to every destination. Every tick is timed,
    /// skipped ones included.
    pub async fn tick(&self) -> TickReport {
        let timer = UploadTimer::start(self.stream.as_str());
        let mut report = TickReport::default();

        let record = match self.source.snapshot(self.stream) {
            Ok(record) => record,
            Err(UploadError::NotReady(reason)) => {
                tracing::debug!(stream = %self.stream, %reason, "Skipping upload");
                report.skipped = true;
                timer.stop();
                return report;
            }
            Err(e) => {
                record_upload_failed(self.stream.as_str());
                tracing::warn!(stream = %self.stream, error = %e, "Failed to query metrics for upload");
                report.skipped = true;
                timer.stop();
                return report;
            }
        };

        for destination in &self.destinations {
            match destination.upload(&record).await {
                Ok(()) => {
                    record_upload(self.stream.as_str());
                    report.delivered += 1;
                }
                Err(e) => {
                    record_upload_failed(self.stream.as_str());
                    tracing::warn!(
                        stream = %self.stream,
                        destination = destination.name(),
                        error = %e,
                        "Upload failed"
                    );
                    report.failed += 1;
                }
            }
        }

        timer.stop();
        report
    }

    /// Run forever on the current tokio runtime.
    ///
    /// The first upload happens one full period after spawning. There is no
    /// stop handle; the task ends with the runtime. A period so large that
    /// the next two deadlines can't be represented is rejected up front.
    pub fn spawn(self) -> UploadResult<JoinHandle<()>> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| UploadError::NoRuntime)?;
        let first = Instant::now()
            .checked_add(self.period)
            .filter(|first| first.checked_add(self.period).is_some())
            .ok_or(UploadError::IntervalTooLarge(self.period))?;

        Ok(handle.spawn(async move {
            let mut ticker = time::interval_at(first, self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let report = self.tick().await;
                tracing::trace!(stream = %self.stream, ?report, "Upload tick");
            }
        }))
    }
}
