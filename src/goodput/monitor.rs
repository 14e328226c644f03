//! Local goodput monitor
//!
//! Wires an [`EventLedger`] to the upload loops: the goodput stream and the
//! step deviation stream each get a JSON-lines sink under the upload
//! directory, plus the cloud sink when a backend is configured and the
//! matching `enable_gcp_*` option is on.

use crate::goodput::engine::{
    EngineFactory, EngineOptions, GoodputEngine, GoodputMonitorHandle, MonitorOptions,
};
use crate::goodput::error::UploadResult;
use crate::goodput::ledger::{EventLedger, LedgerEngine};
use crate::goodput::scheduler::{SnapshotSource, UploadLoop};
use crate::goodput::sink::{BackendSink, JsonLinesSink, UploadDestination};
use crate::goodput::types::{UploadRecord, UploadStream};
use crate::monitoring::{MetricsBackendClient, WorkloadIdentity};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Reads snapshots for one job out of a ledger.
pub struct LedgerSource {
    ledger: Arc<EventLedger>,
    job_name: String,
    include_badput_breakdown: bool,
}

impl LedgerSource {
    pub fn new(ledger: Arc<EventLedger>, job_name: impl Into<String>, include_badput_breakdown: bool) -> Self {
        Self {
            ledger,
            job_name: job_name.into(),
            include_badput_breakdown,
        }
    }
}

impl SnapshotSource for LedgerSource {
    fn snapshot(&self, stream: UploadStream) -> UploadResult<UploadRecord> {
        let now = Utc::now();
        match stream {
            UploadStream::Goodput => self
                .ledger
                .goodput_snapshot(&self.job_name, self.include_badput_breakdown, now)
                .map(UploadRecord::Goodput),
            UploadStream::StepDeviation => self
                .ledger
                .step_deviation_snapshot(&self.job_name, now)
                .map(UploadRecord::StepDeviation),
        }
    }
}

pub struct GoodputMonitor {
    options: MonitorOptions,
    goodput_loop: UploadLoop,
    step_deviation_loop: UploadLoop,
    goodput_task: Mutex<Option<JoinHandle<()>>>,
    step_deviation_task: Mutex<Option<JoinHandle<()>>>,
}

impl GoodputMonitor {
    pub fn new(
        options: MonitorOptions,
        source: Arc<dyn SnapshotSource>,
        cloud: Option<Arc<dyn UploadDestination>>,
    ) -> Self {
        let jsonl: Arc<dyn UploadDestination> = Arc::new(JsonLinesSink::new(&options.upload_dir));
        let gcp = options.gcp_options;

        let mut goodput_destinations = vec![jsonl.clone()];
        let mut step_deviation_destinations = vec![jsonl];
        if let Some(cloud) = cloud {
            if gcp.enable_gcp_goodput_metrics {
                goodput_destinations.push(cloud.clone());
            }
            if gcp.enable_gcp_step_deviation_metrics {
                step_deviation_destinations.push(cloud);
            }
        }

        Self {
            goodput_loop: UploadLoop::new(
                UploadStream::Goodput,
                options.upload_interval,
                source.clone(),
                goodput_destinations,
            ),
            step_deviation_loop: UploadLoop::new(
                UploadStream::StepDeviation,
                options.step_deviation_interval,
                source,
                step_deviation_destinations,
            ),
            options,
            goodput_task: Mutex::new(None),
            step_deviation_task: Mutex::new(None),
        }
    }

    pub fn options(&self) -> &MonitorOptions {
        &self.options
    }

    /// Number of destinations each stream uploads to
    pub fn destination_counts(&self) -> (usize, usize) {
        (
            self.goodput_loop.destination_count(),
            self.step_deviation_loop.destination_count(),
        )
    }

    pub fn is_running(&self, stream: UploadStream) -> bool {
        self.task_slot(stream)
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    fn task_slot(&self, stream: UploadStream) -> &Mutex<Option<JoinHandle<()>>> {
        match stream {
            UploadStream::Goodput => &self.goodput_task,
            UploadStream::StepDeviation => &self.step_deviation_task,
        }
    }

    fn start(&self, upload: &UploadLoop) {
        let stream = upload.stream();
        if !self.options.monitoring_enabled {
            tracing::debug!(%stream, "Monitoring disabled; not starting uploader");
            return;
        }

        let mut slot = self.task_slot(stream).lock();
        if slot.as_ref().is_some_and(|task| !task.is_finished()) {
            tracing::warn!(%stream, "Uploader is already running");
            return;
        }

        match upload.clone().spawn() {
            Ok(task) => {
                tracing::info!(
                    %stream,
                    job_name = %self.options.job_name,
                    interval_secs = upload.period().as_secs(),
                    "Started uploader"
                );
                *slot = Some(task);
            }
            Err(e) => tracing::error!(%stream, error = %e, "Failed to start uploader"),
        }
    }
}

impl GoodputMonitorHandle for GoodputMonitor {
    fn start_goodput_uploader(&self) {
        self.start(&self.goodput_loop);
    }

    fn start_step_deviation_uploader(&self) {
        if !self.options.include_step_deviation {
            tracing::debug!("Step deviation disabled; not starting uploader");
            return;
        }
        self.start(&self.step_deviation_loop);
    }
}

/// Builds [`LedgerEngine`]s and [`GoodputMonitor`]s over one shared ledger.
#[derive(Default)]
pub struct LedgerEngineFactory {
    ledger: Arc<EventLedger>,
    cloud: Option<(MetricsBackendClient, WorkloadIdentity)>,
}

impl LedgerEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also push uploads to a cloud monitoring backend
    pub fn with_backend(mut self, client: MetricsBackendClient, identity: WorkloadIdentity) -> Self {
        self.cloud = Some((client, identity));
        self
    }

    pub fn ledger(&self) -> &Arc<EventLedger> {
        &self.ledger
    }

    /// Monitor with concrete type, for callers that want to inspect it
    pub fn build_monitor(&self, options: &MonitorOptions) -> GoodputMonitor {
        let source = Arc::new(LedgerSource::new(
            self.ledger.clone(),
            options.job_name.clone(),
            options.include_badput_breakdown,
        ));
        let cloud = self.cloud.as_ref().map(|(client, identity)| {
            Arc::new(BackendSink::new(client.clone(), identity.clone())) as Arc<dyn UploadDestination>
        });
        GoodputMonitor::new(options.clone(), source, cloud)
    }
}

impl EngineFactory for LedgerEngineFactory {
    fn create_engine(&self, options: &EngineOptions) -> Arc<dyn GoodputEngine> {
        Arc::new(LedgerEngine::new(
            self.ledger.clone(),
            options.logger_name.clone(),
            options.logging_enabled,
        ))
    }

    fn create_monitor(&self, options: &MonitorOptions) -> Arc<dyn GoodputMonitorHandle> {
        if self.cloud.is_none()
            && (options.gcp_options.enable_gcp_goodput_metrics
                || options.gcp_options.enable_gcp_step_deviation_metrics)
        {
            tracing::info!("No cloud monitoring backend configured; uploading to files only");
        }
        Arc::new(self.build_monitor(options))
    }
}
