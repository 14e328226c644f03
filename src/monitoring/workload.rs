//! Workload health reporting
//!
//! [`WorkloadMonitor`] checks that the metrics backend is reachable and then
//! pushes performance and heartbeat points. Only the connectivity check
//! reports failure to the caller; sends log and swallow their errors so a
//! monitoring outage can never stall or crash the training loop.

use crate::metrics::recorder::{record_workload_metric_failed, record_workload_metric_sent};
use crate::monitoring::client::MetricsBackendClient;
use crate::monitoring::error::{MonitoringError, MonitoringResult};
use crate::monitoring::metadata::{MetadataProvider, INSTANCE_ID_KEY};
use crate::monitoring::types::{
    MetricPoint, MetricValue, WorkloadIdentity, HEARTBEAT_METRIC_TYPE, PERFORMANCE_METRIC_TYPE,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub struct WorkloadMonitor {
    client: MetricsBackendClient,
    identity: WorkloadIdentity,
    metadata: Arc<dyn MetadataProvider>,
    submission_failures: AtomicU64,
}

impl WorkloadMonitor {
    pub fn new(
        client: MetricsBackendClient,
        identity: WorkloadIdentity,
        metadata: Arc<dyn MetadataProvider>,
    ) -> Self {
        Self {
            client,
            identity,
            metadata,
            submission_failures: AtomicU64::new(0),
        }
    }

    pub fn identity(&self) -> &WorkloadIdentity {
        &self.identity
    }

    /// Verify the backend answers a cheap read for this project
    pub async fn check_connectivity(&self) -> MonitoringResult<()> {
        let descriptors = self.client.check_connectivity().await?;
        tracing::info!(
            project_id = %self.identity.project_id,
            descriptors = descriptors.len(),
            "Monitoring backend is reachable"
        );
        Ok(())
    }

    /// Push one performance value. Never fails.
    pub async fn send_performance_metric(&self, perf_metric: f64) {
        let point = MetricPoint::new(
            PERFORMANCE_METRIC_TYPE,
            MetricValue::Double(perf_metric),
            self.identity.resource(),
        );

        match self.client.create_time_series(point).await {
            Ok(()) => {
                record_workload_metric_sent("performance");
                tracing::debug!(value = perf_metric, "Sent performance metric");
            }
            Err(e) => self.submission_failed("performance", &e),
        }
    }

    /// Push one heartbeat for the given ranks. Never fails.
    pub async fn send_heartbeat_metric(&self, local_rank: &str, global_rank: &str) {
        match self.try_send_heartbeat(local_rank, global_rank).await {
            Ok(()) => {
                record_workload_metric_sent("heartbeat");
                tracing::debug!(local_rank, global_rank, "Sent heartbeat metric");
            }
            Err(e) => self.submission_failed("heartbeat", &e),
        }
    }

    /// Sends that failed and were suppressed
    pub fn submission_failures(&self) -> u64 {
        self.submission_failures.load(Ordering::Relaxed)
    }

    async fn try_send_heartbeat(&self, local_rank: &str, global_rank: &str) -> MonitoringResult<()> {
        let instance_id = self
            .metadata
            .get(INSTANCE_ID_KEY)
            .await
            .map_err(|e| MonitoringError::Metadata {
                key: INSTANCE_ID_KEY.to_string(),
                reason: e.to_string(),
            })?;

        let point = MetricPoint::new(
            HEARTBEAT_METRIC_TYPE,
            MetricValue::Bool(true),
            self.identity.resource(),
        )
        .with_label("local_rank", local_rank)
        .with_label("global_rank", global_rank)
        .with_label("instance_id", instance_id);

        self.client.create_time_series(point).await
    }

    fn submission_failed(&self, kind: &str, error: &MonitoringError) {
        self.submission_failures.fetch_add(1, Ordering::Relaxed);
        record_workload_metric_failed(kind);
        tracing::error!(kind, error = %error, "Failed to send workload metric");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::metadata::StaticMetadataProvider;
    use crate::monitoring::testing::FakeBackend;

    const PROJECT: &str = "test-project";

    fn identity() -> WorkloadIdentity {
        WorkloadIdentity::new(PROJECT, "test-zone", "test-workload", "test-replica")
    }

    fn monitor(backend: Arc<FakeBackend>) -> WorkloadMonitor {
        let metadata = StaticMetadataProvider::new().with(INSTANCE_ID_KEY, "test-instance-id");
        WorkloadMonitor::new(
            MetricsBackendClient::new(backend, PROJECT),
            identity(),
            Arc::new(metadata),
        )
    }

    #[tokio::test]
    async fn test_check_connectivity_success() {
        let backend = Arc::new(FakeBackend::healthy());
        let monitor = monitor(backend.clone());

        monitor.check_connectivity().await.unwrap();

        assert_eq!(backend.listed(), vec![format!("projects/{PROJECT}")]);
    }

    #[tokio::test]
    async fn test_check_connectivity_failure() {
        let backend = Arc::new(FakeBackend::failing("API Error"));
        let monitor = monitor(backend);

        let err = monitor.check_connectivity().await.unwrap_err();
        assert!(matches!(err, MonitoringError::Connectivity(msg) if msg.contains("API Error")));
    }

    #[tokio::test]
    async fn test_send_performance_metric_success() {
        let backend = Arc::new(FakeBackend::healthy());
        let monitor = monitor(backend.clone());

        monitor.send_performance_metric(0.123).await;

        let written = backend.written();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].metric_type, PERFORMANCE_METRIC_TYPE);
        assert_eq!(written[0].value, MetricValue::Double(0.123));
        assert_eq!(written[0].resource, identity().resource());
        assert_eq!(monitor.submission_failures(), 0);
    }

    #[tokio::test]
    async fn test_send_performance_metric_failure() {
        let backend = Arc::new(FakeBackend::failing("API Error"));
        let monitor = monitor(backend.clone());

        monitor.send_performance_metric(0.123).await;

        assert_eq!(backend.create_calls(), 1);
        assert_eq!(monitor.submission_failures(), 1);
    }

    #[tokio::test]
    async fn test_send_heartbeat_metric_success() {
        let backend = Arc::new(FakeBackend::healthy());
        let monitor = monitor(backend.clone());

        monitor.send_heartbeat_metric("0", "1").await;

        let written = backend.written();
        assert_eq!(written.len(), 1);
        let point = &written[0];
        assert_eq!(point.metric_type, HEARTBEAT_METRIC_TYPE);
        assert_eq!(point.value, MetricValue::Bool(true));
        assert_eq!(point.metric_labels["local_rank"], "0");
        assert_eq!(point.metric_labels["global_rank"], "1");
        assert_eq!(point.metric_labels["instance_id"], "test-instance-id");
    }

    #[tokio::test]
    async fn test_send_heartbeat_metric_failure() {
        let backend = Arc::new(FakeBackend::failing("API Error"));
        let monitor = monitor(backend.clone());

        monitor.send_heartbeat_metric("0", "1").await;

        assert_eq!(backend.create_calls(), 1);
        assert_eq!(monitor.submission_failures(), 1);
    }

    #[tokio::test]
    async fn test_heartbeat_metadata_failure_skips_submission() {
        let backend = Arc::new(FakeBackend::healthy());
        let monitor = WorkloadMonitor::new(
            MetricsBackendClient::new(backend.clone(), PROJECT),
            identity(),
            Arc::new(StaticMetadataProvider::new()),
        );

        monitor.send_heartbeat_metric("0", "1").await;

        assert_eq!(backend.create_calls(), 0);
        assert_eq!(monitor.submission_failures(), 1);
    }
}
