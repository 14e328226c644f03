//! Goodput recorder
//!
//! Forwards lifecycle events to a goodput engine and starts the background
//! uploaders on the coordinator process. The engine is built on the first
//! `record` call rather than at construction, so nothing touches the
//! distributed runtime before process-wide setup has finished.

use crate::goodput::engine::{
    logger_name, EngineFactory, EngineOptions, GcpOptions, GoodputEngine, GoodputMonitorHandle,
    MonitorOptions,
};
use crate::measurement::{
    Event, EventArgs, MeasurementResult, Recorder, RecorderConfig, RecorderContext,
    RecorderRegistry, WarnLimiter,
};
use crate::metrics::recorder::{record_event_recorded, record_unknown_event};
use std::sync::{Arc, OnceLock};

/// Name the goodput recorder is registered under
pub const GOODPUT_RECORDER: &str = "goodput";

pub struct GoodputRecorder {
    config: RecorderConfig,
    ctx: RecorderContext,
    factory: Arc<dyn EngineFactory>,
    engine: OnceLock<Arc<dyn GoodputEngine>>,
    monitor: OnceLock<Arc<dyn GoodputMonitorHandle>>,
    warnings: WarnLimiter,
}

impl GoodputRecorder {
    pub fn new(config: RecorderConfig, ctx: RecorderContext, factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            config,
            ctx,
            factory,
            engine: OnceLock::new(),
            monitor: OnceLock::new(),
            warnings: WarnLimiter::default(),
        }
    }

    /// Replace the limiter used for ignored-event warnings
    pub fn with_warn_limiter(mut self, warnings: WarnLimiter) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Warnings about ignored events that were actually logged
    pub fn ignored_event_warnings(&self) -> u64 {
        self.warnings.emitted()
    }

    fn engine(&self) -> &Arc<dyn GoodputEngine> {
        self.engine.get_or_init(|| {
            let options = EngineOptions {
                job_name: self.config.name.clone(),
                logger_name: logger_name(&self.config.name),
                logging_enabled: self.ctx.is_coordinator(),
            };
            tracing::debug!(
                job_name = %options.job_name,
                logging_enabled = options.logging_enabled,
                "Creating goodput engine"
            );
            self.factory.create_engine(&options)
        })
    }

    fn monitor(&self) -> &Arc<dyn GoodputMonitorHandle> {
        self.monitor.get_or_init(|| {
            let options = self.monitor_options();
            tracing::debug!(job_name = %options.job_name, "Creating goodput monitor");
            self.factory.create_monitor(&options)
        })
    }

    fn monitor_options(&self) -> MonitorOptions {
        let cfg = &self.config;
        MonitorOptions {
            job_name: cfg.name.clone(),
            logger_name: logger_name(&cfg.name),
            upload_dir: cfg.upload_dir.clone(),
            upload_interval: cfg.upload_period(),
            monitoring_enabled: self.ctx.is_coordinator(),
            include_badput_breakdown: true,
            include_step_deviation: cfg.include_step_deviation,
            step_deviation_interval: cfg.step_deviation_period(),
            gcp_options: GcpOptions {
                enable_gcp_goodput_metrics: cfg.enable_gcp_goodput_metrics,
                enable_gcp_step_deviation_metrics: cfg.enable_gcp_step_deviation_metrics,
            },
        }
    }

    fn ignore(&self, message: String) {
        record_unknown_event();
        self.warnings.warn(&message);
    }
}

impl Recorder for GoodputRecorder {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn record_with(&self, event: Event, args: EventArgs) {
        let engine = self.engine();
        let at = args.timestamp;

        match event {
            Event::StartJob => engine.record_job_start_time(at),
            Event::EndJob => engine.record_job_end_time(at),
            Event::StartStep => match args.step {
                Some(step) => engine.record_step_start_time(step, at),
                None => {
                    self.ignore(format!("Ignoring {event} without a step number"));
                    return;
                }
            },
            Event::StartAcceleratorInit => engine.record_accelerator_init_start_time(at),
            Event::EndAcceleratorInit => engine.record_accelerator_init_end_time(at),
            Event::StartTrainingPreparation => engine.record_training_preparation_start_time(at),
            Event::EndTrainingPreparation => engine.record_training_preparation_end_time(at),
            Event::StartDataLoading => engine.record_data_loading_start_time(at),
            Event::EndDataLoading => engine.record_data_loading_end_time(at),
        }
        record_event_recorded(event.as_str());
    }

    fn record_event_name(&self, name: &str, args: EventArgs) {
        match name.parse::<Event>() {
            Ok(event) => self.record_with(event, args),
            Err(_) => self.ignore(format!("Ignoring unknown event {name}")),
        }
    }

    fn start_monitoring(&self) {
        if !self.ctx.is_coordinator() {
            return;
        }

        let monitor = self.monitor();
        monitor.start_goodput_uploader();
        tracing::info!(job_name = %self.config.name, "Started Goodput upload in the background");

        if self.config.include_step_deviation {
            monitor.start_step_deviation_uploader();
            tracing::info!(
                job_name = %self.config.name,
                "Started Step Deviation upload in the background"
            );
        }
    }
}

/// Register the goodput recorder, building engines through `factory`
pub fn register(registry: &mut RecorderRegistry, factory: Arc<dyn EngineFactory>) -> MeasurementResult<()> {
    registry.register(GOODPUT_RECORDER, move |config, ctx| {
        Ok(Arc::new(GoodputRecorder::new(config, *ctx, factory.clone())) as Arc<dyn Recorder>)
    })
}
