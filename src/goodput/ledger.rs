//! In-process goodput engine
//!
//! [`LedgerEngine`] writes lifecycle timestamps into a shared [`EventLedger`];
//! the monitor reads snapshots back out of the same ledger on every upload
//! tick. Productive time is approximated as the sum of intervals between
//! consecutive step starts.

use crate::goodput::engine::GoodputEngine;
use crate::goodput::error::{UploadError, UploadResult};
use crate::goodput::types::{BadputBreakdown, GoodputSnapshot, StepDeviationSnapshot};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

fn secs_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    ((to - from).num_milliseconds() as f64 / 1000.0).max(0.0)
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        (part * 100.0 / whole).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Accumulated time spent in one kind of overhead.
#[derive(Debug, Default, Clone)]
struct Phase {
    open_since: Option<DateTime<Utc>>,
    closed_secs: f64,
}

impl Phase {
    fn start(&mut self, at: DateTime<Utc>) {
        if self.open_since.is_none() {
            self.open_since = Some(at);
        }
    }

    fn end(&mut self, at: DateTime<Utc>) {
        match self.open_since.take() {
            Some(start) => self.closed_secs += secs_between(start, at),
            None => tracing::debug!("Phase end recorded without a start"),
        }
    }

    /// Total including a still-open phase up to `now`
    fn total_secs(&self, now: DateTime<Utc>) -> f64 {
        self.closed_secs + self.open_since.map_or(0.0, |start| secs_between(start, now))
    }
}

/// Running statistics over step intervals (Welford).
#[derive(Debug, Default, Clone)]
struct StepStats {
    last: Option<(u64, DateTime<Utc>)>,
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
    total: f64,
}

impl StepStats {
    fn record(&mut self, step: u64, at: DateTime<Utc>) {
        if let Some((last_step, last_at)) = self.last {
            // A step that doesn't advance means the job restarted; don't
            // count the gap as productive time.
            if step > last_step {
                self.push(secs_between(last_at, at));
            }
        }
        self.last = Some((step, at));
    }

    fn push(&mut self, interval: f64) {
        if self.count == 0 {
            self.min = interval;
            self.max = interval;
        } else {
            self.min = self.min.min(interval);
            self.max = self.max.max(interval);
        }
        self.count += 1;
        self.total += interval;
        let delta = interval - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (interval - self.mean);
    }

    fn std_dev(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.m2 / self.count as f64).sqrt()
        }
    }

    fn max_deviation(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.max - self.mean).max(self.mean - self.min)
        }
    }

    fn last_step(&self) -> Option<u64> {
        self.last.map(|(step, _)| step)
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    job_start: Option<DateTime<Utc>>,
    job_end: Option<DateTime<Utc>>,
    accelerator_init: Phase,
    training_prep: Phase,
    data_loading: Phase,
    steps: StepStats,
}

/// Shared store of lifecycle timestamps for one job.
#[derive(Debug, Default)]
pub struct EventLedger {
    state: Mutex<LedgerState>,
}

impl EventLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job_started(&self) -> bool {
        self.state.lock().job_start.is_some()
    }

    pub fn last_step(&self) -> Option<u64> {
        self.state.lock().steps.last_step()
    }

    /// Goodput as of `now`
    pub fn goodput_snapshot(
        &self,
        job_name: &str,
        include_badput_breakdown: bool,
        now: DateTime<Utc>,
    ) -> UploadResult<GoodputSnapshot> {
        let state = self.state.lock();
        let job_start = state
            .job_start
            .ok_or_else(|| UploadError::NotReady("job start not recorded".into()))?;

        let until = state.job_end.unwrap_or(now);
        let elapsed = secs_between(job_start, until);
        let productive = state.steps.total.min(elapsed);

        let badput = include_badput_breakdown.then(|| BadputBreakdown {
            accelerator_init_percent: percent(state.accelerator_init.total_secs(until), elapsed),
            training_prep_percent: percent(state.training_prep.total_secs(until), elapsed),
            data_loading_percent: percent(state.data_loading.total_secs(until), elapsed),
        });

        Ok(GoodputSnapshot {
            job_name: job_name.to_string(),
            captured_at: now,
            job_started_at: job_start,
            job_ended: state.job_end.is_some(),
            last_step: state.steps.last_step(),
            elapsed_secs: elapsed,
            productive_secs: productive,
            goodput_percent: percent(productive, elapsed),
            badput,
        })
    }

    /// Step time statistics as of `now`
    pub fn step_deviation_snapshot(
        &self,
        job_name: &str,
        now: DateTime<Utc>,
    ) -> UploadResult<StepDeviationSnapshot> {
        let state = self.state.lock();
        let steps = &state.steps;
        if steps.count == 0 {
            return Err(UploadError::NotReady(
                "need at least two step starts".into(),
            ));
        }

        Ok(StepDeviationSnapshot {
            job_name: job_name.to_string(),
            captured_at: now,
            last_step: steps.last_step(),
            intervals: steps.count,
            mean_step_secs: steps.mean,
            std_dev_secs: steps.std_dev(),
            max_deviation_secs: steps.max_deviation(),
        })
    }

    fn update(&self, f: impl FnOnce(&mut LedgerState)) {
        f(&mut self.state.lock());
    }
}

/// [`GoodputEngine`] backed by an [`EventLedger`].
pub struct LedgerEngine {
    ledger: Arc<EventLedger>,
    logger_name: String,
    logging_enabled: bool,
}

impl LedgerEngine {
    pub fn new(ledger: Arc<EventLedger>, logger_name: impl Into<String>, logging_enabled: bool) -> Self {
        Self {
            ledger,
            logger_name: logger_name.into(),
            logging_enabled,
        }
    }

    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    fn write(&self, f: impl FnOnce(&mut LedgerState)) {
        if self.logging_enabled {
            self.ledger.update(f);
        }
    }
}

fn now_or(at: Option<DateTime<Utc>>) -> DateTime<Utc> {
    at.unwrap_or_else(Utc::now)
}

impl GoodputEngine for LedgerEngine {
    fn record_job_start_time(&self, at: Option<DateTime<Utc>>) {
        let at = now_or(at);
        self.write(|s| {
            s.job_start = Some(at);
            s.job_end = None;
        });
    }

    fn record_job_end_time(&self, at: Option<DateTime<Utc>>) {
        let at = now_or(at);
        self.write(|s| s.job_end = Some(at));
    }

    fn record_step_start_time(&self, step: u64, at: Option<DateTime<Utc>>) {
        let at = now_or(at);
        self.write(|s| s.steps.record(step, at));
    }

    fn record_accelerator_init_start_time(&self, at: Option<DateTime<Utc>>) {
        let at = now_or(at);
        self.write(|s| s.accelerator_init.start(at));
    }

    fn record_accelerator_init_end_time(&self, at: Option<DateTime<Utc>>) {
        let at = now_or(at);
        self.write(|s| s.accelerator_init.end(at));
    }

    fn record_training_preparation_start_time(&self, at: Option<DateTime<Utc>>) {
        let at = now_or(at);
        self.write(|s| s.training_prep.start(at));
    }

    fn record_training_preparation_end_time(&self, at: Option<DateTime<Utc>>) {
        let at = now_or(at);
        self.write(|s| s.training_prep.end(at));
    }

    fn record_data_loading_start_time(&self, at: Option<DateTime<Utc>>) {
        let at = now_or(at);
        self.write(|s| s.data_loading.start(at));
    }

    fn record_data_loading_end_time(&self, at: Option<DateTime<Utc>>) {
        let at = now_or(at);
        self.write(|s| s.data_loading.end(at));
    }
}
