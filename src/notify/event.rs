//! Timer lifecycle events

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::Phase;

/// What happened to the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Started,
    Tick,
    Paused,
    Resumed,
    PhaseCompleted,
    Cancelled,
    /// The waiter failed and the timer stopped
    TimerFault,
}

/// Immutable record of one timer transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub kind: EventKind,
    pub phase: Phase,
    pub remaining: Duration,
    /// Phases completed when the event was produced
    pub cycle_count: u64,
    pub at_utc: DateTime<Utc>,
    /// Failure description, only set for [`EventKind::TimerFault`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
}

impl NotificationEvent {
    pub fn new(kind: EventKind, phase: Phase, remaining: Duration, cycle_count: u64) -> Self {
        Self {
            kind,
            phase,
            remaining,
            cycle_count,
            at_utc: Utc::now(),
            fault: None,
        }
    }

    pub fn fault(phase: Phase, remaining: Duration, cycle_count: u64, message: String) -> Self {
        Self {
            fault: Some(message),
            ..Self::new(EventKind::TimerFault, phase, remaining, cycle_count)
        }
    }

    pub fn is(&self, kind: EventKind) -> bool {
        self.kind == kind
    }
}
