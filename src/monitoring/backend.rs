//! Interface to a remote time-series store

use crate::monitoring::error::BackendError;
use crate::monitoring::types::{MetricPoint, ResourceDescriptor};
use async_trait::async_trait;

/// Remote time-series write/read API.
///
/// Calls are single-shot; any retry policy belongs to the implementation.
#[async_trait]
pub trait MetricsBackend: Send + Sync {
    /// List monitored-resource descriptors under `name` (`projects/{id}`)
    async fn list_monitored_resource_descriptors(
        &self,
        name: &str,
    ) -> Result<Vec<ResourceDescriptor>, BackendError>;

    /// Write time series points under `name` (`projects/{id}`)
    async fn create_time_series(&self, name: &str, series: &[MetricPoint]) -> Result<(), BackendError>;
}
