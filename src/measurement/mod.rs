//! Lifecycle measurement
//!
//! Events, recorder configuration, the recorder registry and the
//! process-level [`Measurement`] handle the training driver talks to.

pub mod config;
pub mod error;
pub mod recorder;
pub mod registry;
pub mod types;
pub mod warn_limiter;

pub use config::RecorderConfig;
pub use error::{MeasurementError, MeasurementResult};
pub use recorder::{Measurement, Recorder, RecorderContext, RecorderFlags};
pub use registry::{RecorderFactory, RecorderRegistry};
pub use types::{Event, EventArgs, UnknownEvent};
pub use warn_limiter::WarnLimiter;
