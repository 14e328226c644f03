use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle milestones a recorder understands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    StartJob,
    EndJob,
    StartStep,
    StartAcceleratorInit,
    EndAcceleratorInit,
    StartTrainingPreparation,
    EndTrainingPreparation,
    StartDataLoading,
    EndDataLoading,
}

impl Event {
    pub const ALL: [Event; 9] = [
        Event::StartJob,
        Event::EndJob,
        Event::StartStep,
        Event::StartAcceleratorInit,
        Event::EndAcceleratorInit,
        Event::StartTrainingPreparation,
        Event::EndTrainingPreparation,
        Event::StartDataLoading,
        Event::EndDataLoading,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Event::StartJob => "START_JOB",
            Event::EndJob => "END_JOB",
            Event::StartStep => "START_STEP",
            Event::StartAcceleratorInit => "START_ACCELERATOR_INIT",
            Event::EndAcceleratorInit => "END_ACCELERATOR_INIT",
            Event::StartTrainingPreparation => "START_TRAINING_PREPARATION",
            Event::EndTrainingPreparation => "END_TRAINING_PREPARATION",
            Event::StartDataLoading => "START_DATA_LOADING",
            Event::EndDataLoading => "END_DATA_LOADING",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name any known [`Event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEvent(pub String);

impl fmt::Display for UnknownEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event {}", self.0)
    }
}

impl std::error::Error for UnknownEvent {}

impl FromStr for Event {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Event::ALL
            .iter()
            .copied()
            .find(|event| event.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownEvent(s.to_string()))
    }
}

/// Optional arguments that travel with an event.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EventArgs {
    /// Step number, required by [`Event::StartStep`]
    pub step: Option<u64>,

    /// When the event happened (engine uses "now" if unset)
    pub timestamp: Option<DateTime<Utc>>,
}

impl EventArgs {
    pub fn step(step: u64) -> Self {
        Self {
            step: Some(step),
            ..Default::default()
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_round_trip() {
        for event in Event::ALL {
            assert_eq!(event.as_str().parse::<Event>().unwrap(), event);
        }
    }

    #[test]
    fn test_event_parse_is_case_insensitive() {
        assert_eq!("start_job".parse::<Event>().unwrap(), Event::StartJob);
        assert_eq!(" End_Data_Loading ".parse::<Event>().unwrap(), Event::EndDataLoading);
    }

    #[test]
    fn test_unknown_event() {
        let err = "START_CHECKPOINT".parse::<Event>().unwrap_err();
        assert_eq!(err, UnknownEvent("START_CHECKPOINT".into()));
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let json = serde_json::to_string(&Event::StartAcceleratorInit).unwrap();
        assert_eq!(json, "\"START_ACCELERATOR_INIT\"");
    }

    #[test]
    fn test_event_args_builder() {
        let now = Utc::now();
        let args = EventArgs::step(7).at(now);
        assert_eq!(args.step, Some(7));
        assert_eq!(args.timestamp, Some(now));
    }
}
