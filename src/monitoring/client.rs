use crate::metrics::recorder::record_connectivity_check;
use crate::monitoring::backend::MetricsBackend;
use crate::monitoring::error::{MonitoringError, MonitoringResult};
use crate::monitoring::types::{MetricPoint, ResourceDescriptor};
use std::sync::Arc;

/// Project-scoped wrapper over a [`MetricsBackend`].
///
/// Every backend failure leaves this type as a [`MonitoringError`].
#[derive(Clone)]
pub struct MetricsBackendClient {
    backend: Arc<dyn MetricsBackend>,
    project_id: String,
}

impl MetricsBackendClient {
    pub fn new(backend: Arc<dyn MetricsBackend>, project_id: impl Into<String>) -> Self {
        Self {
            backend,
            project_id: project_id.into(),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// `projects/{project_id}`
    pub fn project_name(&self) -> String {
        format!("projects/{}", self.project_id)
    }

    /// Lightweight read used to prove the backend is reachable
    pub async fn check_connectivity(&self) -> MonitoringResult<Vec<ResourceDescriptor>> {
        let name = self.project_name();
        match self.backend.list_monitored_resource_descriptors(&name).await {
            Ok(descriptors) => {
                record_connectivity_check(true);
                Ok(descriptors)
            }
            Err(e) => {
                record_connectivity_check(false);
                Err(MonitoringError::Connectivity(format!("{name}: {e}")))
            }
        }
    }

    /// Submit one point
    pub async fn create_time_series(&self, point: MetricPoint) -> MonitoringResult<()> {
        self.create_time_series_batch(std::slice::from_ref(&point)).await
    }

    /// Submit several points in one call
    pub async fn create_time_series_batch(&self, points: &[MetricPoint]) -> MonitoringResult<()> {
        if points.is_empty() {
            return Ok(());
        }
        self.backend
            .create_time_series(&self.project_name(), points)
            .await
            .map_err(MonitoringError::from)
    }
}

impl std::fmt::Debug for MetricsBackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsBackendClient")
            .field("project_id", &self.project_id)
            .finish()
    }
}
