//! Goodput recording and upload
//!
//! [`GoodputRecorder`] forwards lifecycle events to a goodput engine and, on
//! the coordinator process, starts two periodic uploaders: one for goodput
//! and badput, one for step deviation. The bundled [`LedgerEngineFactory`]
//! keeps everything in process and writes JSON lines under the upload
//! directory, optionally mirroring to a cloud monitoring backend.

pub mod engine;
pub mod error;
pub mod ledger;
pub mod monitor;
pub mod recorder;
pub mod scheduler;
pub mod sink;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{
    EngineFactory, EngineOptions, GcpOptions, GoodputEngine, GoodputMonitorHandle, MonitorOptions,
};
pub use error::{UploadError, UploadResult};
pub use ledger::{EventLedger, LedgerEngine};
pub use monitor::{GoodputMonitor, LedgerEngineFactory, LedgerSource};
pub use recorder::{register, GoodputRecorder, GOODPUT_RECORDER};
pub use scheduler::{SnapshotSource, TickReport, UploadLoop};
pub use sink::{BackendSink, JsonLinesSink, UploadDestination};
pub use types::{
    BadputBreakdown, GoodputSnapshot, StepDeviationSnapshot, UploadRecord, UploadStream,
};
