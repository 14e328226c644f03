use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const WORKLOAD_RESOURCE_TYPE: &str = "compute.googleapis.com/Workload";
pub const PERFORMANCE_METRIC_TYPE: &str = "compute.googleapis.com/workload/performance";
pub const HEARTBEAT_METRIC_TYPE: &str = "compute.googleapis.com/workload/heartbeat";

/// Identifies the workload every point is attributed to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkloadIdentity {
    pub project_id: String,
    pub zone: String,
    pub workload_id: String,
    pub replica_id: String,
}

impl WorkloadIdentity {
    pub fn new(
        project_id: impl Into<String>,
        zone: impl Into<String>,
        workload_id: impl Into<String>,
        replica_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            zone: zone.into(),
            workload_id: workload_id.into(),
            replica_id: replica_id.into(),
        }
    }

    /// Monitored resource describing this workload
    pub fn resource(&self) -> MonitoredResource {
        let mut labels = BTreeMap::new();
        labels.insert("project_id".to_string(), self.project_id.clone());
        labels.insert("location".to_string(), self.zone.clone());
        labels.insert("workload_id".to_string(), self.workload_id.clone());
        labels.insert("replica_id".to_string(), self.replica_id.clone());

        MonitoredResource {
            resource_type: WORKLOAD_RESOURCE_TYPE.to_string(),
            labels,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonitoredResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub labels: BTreeMap<String, String>,
}

/// A monitored-resource descriptor as listed by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum MetricValue {
    Double(f64),
    Bool(bool),
}

/// One point of one time series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricPoint {
    pub metric_type: String,
    pub metric_labels: BTreeMap<String, String>,
    pub value: MetricValue,
    pub timestamp: DateTime<Utc>,
    pub resource: MonitoredResource,
}

impl MetricPoint {
    /// A point stamped "now"
    pub fn new(metric_type: impl Into<String>, value: MetricValue, resource: MonitoredResource) -> Self {
        Self {
            metric_type: metric_type.into(),
            metric_labels: BTreeMap::new(),
            value,
            timestamp: Utc::now(),
            resource,
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metric_labels.insert(key.into(), value.into());
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_resource_labels() {
        let identity = WorkloadIdentity::new("proj", "us-east5-a", "wl", "r0");
        let resource = identity.resource();

        assert_eq!(resource.resource_type, WORKLOAD_RESOURCE_TYPE);
        assert_eq!(resource.labels["project_id"], "proj");
        assert_eq!(resource.labels["location"], "us-east5-a");
        assert_eq!(resource.labels["workload_id"], "wl");
        assert_eq!(resource.labels["replica_id"], "r0");
    }

    #[test]
    fn test_point_builder() {
        let identity = WorkloadIdentity::new("proj", "zone", "wl", "r0");
        let point = MetricPoint::new(HEARTBEAT_METRIC_TYPE, MetricValue::Bool(true), identity.resource())
            .with_label("local_rank", "0")
            .with_label("global_rank", "1");

        assert_eq!(point.metric_labels.len(), 2);
        assert_eq!(point.value, MetricValue::Bool(true));
    }
}
