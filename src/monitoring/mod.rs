//! Workload monitoring
//!
//! A thin client over a remote time-series backend plus the
//! [`WorkloadMonitor`] that pushes performance and heartbeat points through it.

pub mod backend;
pub mod client;
pub mod error;
pub mod metadata;
pub mod types;
pub mod workload;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::MetricsBackend;
pub use client::MetricsBackendClient;
pub use error::{BackendError, MonitoringError, MonitoringResult};
pub use metadata::{EnvMetadataProvider, MetadataProvider, StaticMetadataProvider, INSTANCE_ID_KEY};
pub use types::{
    MetricPoint, MetricValue, MonitoredResource, ResourceDescriptor, WorkloadIdentity,
    HEARTBEAT_METRIC_TYPE, PERFORMANCE_METRIC_TYPE, WORKLOAD_RESOURCE_TYPE,
};
pub use workload::WorkloadMonitor;
