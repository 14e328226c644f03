//! Runs a simulated training loop under a recorder chosen on the command line.
//!
//! ```text
//! launch-trainer --recorder_type=goodput \
//!     --recorder_spec=name=my-run \
//!     --recorder_spec=upload_dir=/tmp/my-run/summaries \
//!     --recorder_spec=upload_interval=30 \
//!     --steps=100 --step_ms=500
//! ```
//!
//! Uploads go to JSON-lines files under `upload_dir` only. No cloud metrics
//! backend is wired in here, so the `enable_gcp_*` keys have no effect and
//! nothing runs a workload connectivity check; embed the library with
//! `LedgerEngineFactory::with_backend` and a `WorkloadMonitor` for that.

use anyhow::Context;
use clap::Parser;
use goodput_monitor::goodput::{self, LedgerEngineFactory};
use goodput_monitor::launch::{launch_trainer, process_index_from_env};
use goodput_monitor::measurement::{
    Event, EventArgs, Measurement, RecorderContext, RecorderFlags, RecorderRegistry,
};
use goodput_monitor::metrics::{init_metrics, start_metrics_server, MetricsConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "launch-trainer")]
#[command(about = "Run a simulated training job with goodput recording")]
struct Cli {
    /// Registered recorder name, optionally as `module:name`
    #[arg(long = "recorder_type", value_name = "TYPE")]
    recorder_type: Option<String>,

    /// Recorder config as key=value; repeat for each key
    #[arg(long = "recorder_spec", value_name = "KEY=VALUE")]
    recorder_spec: Vec<String>,

    /// Number of training steps to simulate
    #[arg(long, default_value_t = 20)]
    steps: u64,

    /// Simulated compute time per step
    #[arg(long = "step_ms", default_value_t = 200)]
    step_ms: u64,

    /// Simulated input pipeline time per step
    #[arg(long = "data_loading_ms", default_value_t = 20)]
    data_loading_ms: u64,

    /// Serve Prometheus metrics on this address
    #[arg(long = "metrics_addr", value_name = "ADDR")]
    metrics_addr: Option<SocketAddr>,
}

async fn train(measurement: Measurement, cli: &Cli) -> u64 {
    tokio::time::sleep(Duration::from_millis(cli.step_ms)).await;
    measurement.record_event(Event::EndAcceleratorInit);

    measurement.record_event(Event::StartTrainingPreparation);
    tokio::time::sleep(Duration::from_millis(cli.step_ms)).await;
    measurement.record_event(Event::EndTrainingPreparation);

    for step in 0..cli.steps {
        measurement.record_event(Event::StartDataLoading);
        tokio::time::sleep(Duration::from_millis(cli.data_loading_ms)).await;
        measurement.record_event(Event::EndDataLoading);

        measurement.record_event_with(Event::StartStep, EventArgs::step(step));
        tokio::time::sleep(Duration::from_millis(cli.step_ms)).await;
    }
    cli.steps
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    init_metrics();
    if let Some(addr) = cli.metrics_addr {
        start_metrics_server(MetricsConfig::with_addr(addr))
            .context("failed to start metrics server")?;
    }

    let mut registry = RecorderRegistry::new();
    goodput::register(&mut registry, Arc::new(LedgerEngineFactory::new()))?;

    let flags = RecorderFlags {
        recorder_type: cli.recorder_type.clone(),
        recorder_spec: cli.recorder_spec.clone(),
    };
    let ctx = RecorderContext::new(process_index_from_env());

    let steps = launch_trainer(&registry, &flags, &ctx, |measurement| train(measurement, &cli))
        .await
        .context("failed to initialize recorder")?;

    println!("✓ Completed {steps} steps");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use goodput_monitor::measurement::Recorder;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct EventLog(Mutex<Vec<Event>>);

    impl Recorder for EventLog {
        fn name(&self) -> &str {
            "log"
        }
        fn record_with(&self, event: Event, _args: EventArgs) {
            self.0.lock().push(event);
        }
        fn record_event_name(&self, _name: &str, _args: EventArgs) {}
        fn start_monitoring(&self) {}
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_phases_do_not_overlap() {
        let cli = Cli::parse_from(["launch-trainer", "--steps=2", "--step_ms=5", "--data_loading_ms=1"]);
        let log = Arc::new(EventLog::default());

        let steps = train(Measurement::with_recorder(log.clone()), &cli).await;

        assert_eq!(steps, 2);
        let events = log.0.lock().clone();
        assert_eq!(
            &events[..3],
            &[
                Event::EndAcceleratorInit,
                Event::StartTrainingPreparation,
                Event::EndTrainingPreparation
            ]
        );
        assert_eq!(events.iter().filter(|e| **e == Event::StartStep).count(), 2);
    }
}
