use thiserror::Error;

#[derive(Error, Debug)]
pub enum MeasurementError {
    #[error("Recorder already registered: {0}")]
    DuplicateRecorder(String),

    #[error("Unknown recorder type: {0}")]
    UnknownRecorder(String),

    #[error("Invalid recorder config: {0}")]
    ConfigValidation(String),
}

impl From<serde_json::Error> for MeasurementError {
    fn from(err: serde_json::Error) -> Self {
        MeasurementError::ConfigValidation(err.to_string())
    }
}

pub type MeasurementResult<T> = Result<T, MeasurementError>;
