use crate::measurement::config::RecorderConfig;
use crate::measurement::error::MeasurementResult;
use crate::measurement::registry::RecorderRegistry;
use crate::measurement::types::{Event, EventArgs};
use std::sync::Arc;

/// A sink for lifecycle events.
///
/// Implementations must never fail the caller: `record` and
/// `start_monitoring` swallow and log whatever goes wrong underneath.
pub trait Recorder: Send + Sync {
    /// Job name this recorder was configured with
    fn name(&self) -> &str;

    /// Record `event` with extra arguments
    fn record_with(&self, event: Event, args: EventArgs);

    /// Record an event given by name; unknown names are logged and ignored
    fn record_event_name(&self, name: &str, args: EventArgs);

    /// Start background uploads (coordinator process only)
    fn start_monitoring(&self);

    /// Record `event` with no extra arguments
    fn record(&self, event: Event) {
        self.record_with(event, EventArgs::default());
    }
}

/// Process facts a recorder needs at construction time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecorderContext {
    /// Index of this process in the distributed job
    pub process_index: usize,
}

impl RecorderContext {
    pub fn new(process_index: usize) -> Self {
        Self { process_index }
    }

    /// Rank 0 performs logging and monitoring side effects
    pub fn is_coordinator(&self) -> bool {
        self.process_index == 0
    }
}

/// Recorder selection as given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecorderFlags {
    /// Registered recorder name, optionally prefixed with `path:`
    pub recorder_type: Option<String>,

    /// `key=value` pairs forming the [`RecorderConfig`]
    pub recorder_spec: Vec<String>,
}

/// Process-level handle to the configured recorder, if any.
///
/// Every operation is a no-op when no recorder was configured.
#[derive(Clone, Default)]
pub struct Measurement {
    recorder: Option<Arc<dyn Recorder>>,
}

impl Measurement {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_recorder(recorder: Arc<dyn Recorder>) -> Self {
        Self {
            recorder: Some(recorder),
        }
    }

    /// Build the recorder selected by `flags`.
    ///
    /// Configuration and registry errors are returned; they are fatal at startup.
    pub fn initialize(
        registry: &RecorderRegistry,
        flags: &RecorderFlags,
        ctx: &RecorderContext,
    ) -> MeasurementResult<Self> {
        let Some(recorder_type) = flags.recorder_type.as_deref() else {
            if !flags.recorder_spec.is_empty() {
                tracing::debug!("recorder_spec given without recorder_type; measurement disabled");
            }
            return Ok(Self::disabled());
        };

        let config = RecorderConfig::from_spec(&flags.recorder_spec)?;
        let recorder = registry.construct(recorder_type, config, ctx)?;
        tracing::info!(
            recorder_type,
            job_name = recorder.name(),
            process_index = ctx.process_index,
            "Initialized recorder"
        );
        Ok(Self::with_recorder(recorder))
    }

    pub fn recorder(&self) -> Option<&Arc<dyn Recorder>> {
        self.recorder.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.recorder.is_some()
    }

    pub fn record_event(&self, event: Event) {
        self.record_event_with(event, EventArgs::default());
    }

    pub fn record_event_with(&self, event: Event, args: EventArgs) {
        if let Some(recorder) = &self.recorder {
            recorder.record_with(event, args);
        }
    }

    pub fn start_monitoring(&self) {
        if let Some(recorder) = &self.recorder {
            recorder.start_monitoring();
        }
    }
}

impl std::fmt::Debug for Measurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Measurement")
            .field("recorder", &self.recorder.as_ref().map(|r| r.name().to_string()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct ListRecorder {
        events: Mutex<Vec<Event>>,
        monitoring_started: Mutex<u32>,
    }

    impl Recorder for ListRecorder {
        fn name(&self) -> &str {
            "list"
        }

        fn record_with(&self, event: Event, _args: EventArgs) {
            self.events.lock().push(event);
        }

        fn record_event_name(&self, name: &str, args: EventArgs) {
            if let Ok(event) = name.parse() {
                self.record_with(event, args);
            }
        }

        fn start_monitoring(&self) {
            *self.monitoring_started.lock() += 1;
        }
    }

    #[test]
    fn test_disabled_measurement_is_noop() {
        let measurement = Measurement::disabled();
        assert!(!measurement.is_enabled());
        measurement.record_event(Event::StartJob);
        measurement.start_monitoring();
    }

    #[test]
    fn test_measurement_forwards_to_recorder() {
        let recorder = Arc::new(ListRecorder::default());
        let measurement = Measurement::with_recorder(recorder.clone());

        measurement.record_event(Event::StartJob);
        measurement.record_event_with(Event::StartStep, EventArgs::step(1));
        measurement.start_monitoring();

        assert_eq!(*recorder.events.lock(), vec![Event::StartJob, Event::StartStep]);
        assert_eq!(*recorder.monitoring_started.lock(), 1);
    }

    #[test]
    fn test_initialize_without_type_is_disabled() {
        let registry = RecorderRegistry::new();
        let flags = RecorderFlags {
            recorder_type: None,
            recorder_spec: vec!["name=x".into()],
        };
        let measurement =
            Measurement::initialize(&registry, &flags, &RecorderContext::default()).unwrap();
        assert!(!measurement.is_enabled());
    }

    #[test]
    fn test_initialize_constructs_registered_recorder() {
        let mut registry = RecorderRegistry::new();
        registry
            .register("list", |_config, _ctx| {
                Ok(Arc::new(ListRecorder::default()) as Arc<dyn Recorder>)
            })
            .unwrap();

        let flags = RecorderFlags {
            recorder_type: Some("my.module:list".into()),
            recorder_spec: vec![
                "name=job".into(),
                "upload_dir=/tmp/out".into(),
                "upload_interval=30".into(),
            ],
        };
        let measurement =
            Measurement::initialize(&registry, &flags, &RecorderContext::default()).unwrap();
        assert!(measurement.is_enabled());
        assert_eq!(measurement.recorder().unwrap().name(), "list");
    }

    #[test]
    fn test_initialize_rejects_bad_config() {
        let mut registry = RecorderRegistry::new();
        registry
            .register("list", |_config, _ctx| {
                Ok(Arc::new(ListRecorder::default()) as Arc<dyn Recorder>)
            })
            .unwrap();

        let flags = RecorderFlags {
            recorder_type: Some("list".into()),
            recorder_spec: vec!["name=job".into(), "upload_interval=30".into()],
        };
        assert!(Measurement::initialize(&registry, &flags, &RecorderContext::default()).is_err());
    }

    #[test]
    fn test_coordinator_is_rank_zero() {
        assert!(RecorderContext::new(0).is_coordinator());
        assert!(!RecorderContext::new(3).is_coordinator());
    }
}
