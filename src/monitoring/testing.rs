//! In-memory backend for tests

use crate::monitoring::backend::MetricsBackend;
use crate::monitoring::error::BackendError;
use crate::monitoring::types::{MetricPoint, ResourceDescriptor, WORKLOAD_RESOURCE_TYPE};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub struct FakeBackend {
    failure: Option<String>,
    listed: Mutex<Vec<String>>,
    written: Mutex<Vec<MetricPoint>>,
    create_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn healthy() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn listed(&self) -> Vec<String> {
        self.listed.lock().clone()
    }

    pub fn written(&self) -> Vec<MetricPoint> {
        self.written.lock().clone()
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricsBackend for FakeBackend {
    async fn list_monitored_resource_descriptors(
        &self,
        name: &str,
    ) -> Result<Vec<ResourceDescriptor>, BackendError> {
        self.listed.lock().push(name.to_string());
        match &self.failure {
            Some(message) => Err(BackendError::new(message.clone())),
            None => Ok(vec![ResourceDescriptor {
                name: format!("{name}/monitoredResourceDescriptors/{WORKLOAD_RESOURCE_TYPE}"),
                resource_type: WORKLOAD_RESOURCE_TYPE.to_string(),
            }]),
        }
    }

    async fn create_time_series(&self, _name: &str, series: &[MetricPoint]) -> Result<(), BackendError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(BackendError::new(message.clone())),
            None => {
                self.written.lock().extend_from_slice(series);
                Ok(())
            }
        }
    }
}
