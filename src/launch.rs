//! Trainer lifecycle driver
//!
//! Brackets a training run with lifecycle events:
//! START_JOB and START_ACCELERATOR_INIT before the trainer, background
//! monitoring while it runs, END_JOB after it returns.

use crate::measurement::{
    Event, Measurement, MeasurementResult, RecorderContext, RecorderFlags, RecorderRegistry,
};
use std::future::Future;

/// Environment variables consulted for this process's index, in order
pub const PROCESS_INDEX_VARS: [&str; 2] = ["PROCESS_INDEX", "RANK"];

/// Read the process index from the environment, defaulting to 0
pub fn process_index_from_env() -> usize {
    PROCESS_INDEX_VARS
        .iter()
        .find_map(|var| std::env::var(var).ok()?.trim().parse().ok())
        .unwrap_or(0)
}

/// Run `trainer` under the recorder selected by `flags`.
///
/// Only recorder setup can fail; the trainer's output is returned as is.
pub async fn launch_trainer<F, Fut, T>(
    registry: &RecorderRegistry,
    flags: &RecorderFlags,
    ctx: &RecorderContext,
    trainer: F,
) -> MeasurementResult<T>
where
    F: FnOnce(Measurement) -> Fut,
    Fut: Future<Output = T>,
{
    let measurement = Measurement::initialize(registry, flags, ctx)?;
    measurement.record_event(Event::StartJob);
    measurement.record_event(Event::StartAcceleratorInit);

    measurement.start_monitoring();
    let output = trainer(measurement.clone()).await;

    measurement.record_event(Event::EndJob);
    tracing::info!(process_index = ctx.process_index, "Training finished");
    Ok(output)
}
