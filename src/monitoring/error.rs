use thiserror::Error;

/// Failure reported by a metrics backend or metadata source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Error, Debug)]
pub enum MonitoringError {
    #[error("Failed to connect to monitoring backend: {0}")]
    Connectivity(String),

    #[error("Failed to submit metric: {0}")]
    Submission(#[from] BackendError),

    #[error("Failed to resolve metadata {key}: {reason}")]
    Metadata { key: String, reason: String },
}

pub type MonitoringResult<T> = Result<T, MonitoringError>;
