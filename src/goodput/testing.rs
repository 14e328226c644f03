//! Recording fakes for the engine interface

use crate::goodput::engine::{
    EngineFactory, EngineOptions, GoodputEngine, GoodputMonitorHandle, MonitorOptions,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartCall {
    Goodput,
    StepDeviation,
}

#[derive(Default)]
struct Journal {
    engine_calls: Vec<&'static str>,
    last_step: Option<(u64, Option<DateTime<Utc>>)>,
    start_calls: Vec<StartCall>,
}

pub struct FakeEngine {
    journal: Arc<Mutex<Journal>>,
}

impl FakeEngine {
    fn call(&self, name: &'static str) {
        self.journal.lock().engine_calls.push(name);
    }
}

impl GoodputEngine for FakeEngine {
    fn record_job_start_time(&self, _at: Option<DateTime<Utc>>) {
        self.call("record_job_start_time");
    }

    fn record_job_end_time(&self, _at: Option<DateTime<Utc>>) {
        self.call("record_job_end_time");
    }

    fn record_step_start_time(&self, step: u64, at: Option<DateTime<Utc>>) {
        self.call("record_step_start_time");
        self.journal.lock().last_step = Some((step, at));
    }

    fn record_accelerator_init_start_time(&self, _at: Option<DateTime<Utc>>) {
        self.call("record_accelerator_init_start_time");
    }

    fn record_accelerator_init_end_time(&self, _at: Option<DateTime<Utc>>) {
        self.call("record_accelerator_init_end_time");
    }

    fn record_training_preparation_start_time(&self, _at: Option<DateTime<Utc>>) {
        self.call("record_training_preparation_start_time");
    }

    fn record_training_preparation_end_time(&self, _at: Option<DateTime<Utc>>) {
        self.call("record_training_preparation_end_time");
    }

    fn record_data_loading_start_time(&self, _at: Option<DateTime<Utc>>) {
        self.call("record_data_loading_start_time");
    }

    fn record_data_loading_end_time(&self, _at: Option<DateTime<Utc>>) {
        self.call("record_data_loading_end_time");
    }
}

pub struct FakeMonitor {
    journal: Arc<Mutex<Journal>>,
}

impl GoodputMonitorHandle for FakeMonitor {
    fn start_goodput_uploader(&self) {
        self.journal.lock().start_calls.push(StartCall::Goodput);
    }

    fn start_step_deviation_uploader(&self) {
        self.journal.lock().start_calls.push(StartCall::StepDeviation);
    }
}

/// Factory that counts what it builds and journals every call.
#[derive(Default)]
pub struct FakeFactory {
    journal: Arc<Mutex<Journal>>,
    engine_options: Mutex<Vec<EngineOptions>>,
    monitor_options: Mutex<Vec<MonitorOptions>>,
}

impl FakeFactory {
    pub fn engines_created(&self) -> usize {
        self.engine_options.lock().len()
    }

    pub fn monitors_created(&self) -> usize {
        self.monitor_options.lock().len()
    }

    pub fn engine_options(&self) -> Option<EngineOptions> {
        self.engine_options.lock().last().cloned()
    }

    pub fn monitor_options(&self) -> Option<MonitorOptions> {
        self.monitor_options.lock().last().cloned()
    }

    pub fn engine_calls(&self) -> Vec<&'static str> {
        self.journal.lock().engine_calls.clone()
    }

    pub fn last_step(&self) -> Option<(u64, Option<DateTime<Utc>>)> {
        self.journal.lock().last_step
    }

    pub fn start_calls(&self) -> Vec<StartCall> {
        self.journal.lock().start_calls.clone()
    }
}

impl EngineFactory for FakeFactory {
    fn create_engine(&self, options: &EngineOptions) -> Arc<dyn GoodputEngine> {
        self.engine_options.lock().push(options.clone());
        Arc::new(FakeEngine {
            journal: self.journal.clone(),
        })
    }

    fn create_monitor(&self, options: &MonitorOptions) -> Arc<dyn GoodputMonitorHandle> {
        self.monitor_options.lock().push(options.clone());
        Arc::new(FakeMonitor {
            journal: self.journal.clone(),
        })
    }
}
