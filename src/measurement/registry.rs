//! Named recorder factories
//!
//! The registry is built once at startup and passed to whatever constructs
//! recorders, so the lifecycle driver can pick an implementation purely by
//! configuration string.

use crate::measurement::config::RecorderConfig;
use crate::measurement::error::{MeasurementError, MeasurementResult};
use crate::measurement::recorder::{Recorder, RecorderContext};
use std::collections::HashMap;
use std::sync::Arc;

pub type RecorderFactory = Box<
    dyn Fn(RecorderConfig, &RecorderContext) -> MeasurementResult<Arc<dyn Recorder>> + Send + Sync,
>;

#[derive(Default)]
pub struct RecorderRegistry {
    factories: HashMap<String, RecorderFactory>,
}

impl RecorderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to a recorder factory
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> MeasurementResult<()>
    where
        F: Fn(RecorderConfig, &RecorderContext) -> MeasurementResult<Arc<dyn Recorder>>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(MeasurementError::DuplicateRecorder(name));
        }
        tracing::debug!(recorder_type = %name, "Registered recorder");
        self.factories.insert(name, Box::new(factory));
        Ok(())
    }

    /// Construct the recorder registered under `recorder_type`.
    ///
    /// `recorder_type` may carry a `path:` prefix; only the part after the
    /// last `:` is looked up.
    pub fn construct(
        &self,
        recorder_type: &str,
        config: RecorderConfig,
        ctx: &RecorderContext,
    ) -> MeasurementResult<Arc<dyn Recorder>> {
        let name = Self::lookup_name(recorder_type);
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| MeasurementError::UnknownRecorder(recorder_type.to_string()))?;
        config.validate()?;
        factory(config, ctx)
    }

    pub fn contains(&self, recorder_type: &str) -> bool {
        self.factories.contains_key(Self::lookup_name(recorder_type))
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn lookup_name(recorder_type: &str) -> &str {
        recorder_type
            .rsplit_once(':')
            .map_or(recorder_type, |(_, name)| name)
            .trim()
    }
}

impl std::fmt::Debug for RecorderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecorderRegistry")
            .field("names", &self.names())
            .finish()
    }
}
