use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Nothing to upload yet: {0}")]
    NotReady(String),

    #[error("No async runtime available to run uploader")]
    NoRuntime,

    #[error("Upload interval too large to schedule: {0:?}")]
    IntervalTooLarge(std::time::Duration),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Monitoring error: {0}")]
    MonitoringError(#[from] crate::monitoring::MonitoringError),
}

pub type UploadResult<T> = Result<T, UploadError>;
