//! Console response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    engine::TimerEngine,
    state::{Phase, TimerStatus},
    utils::format_clock,
};

/// Timer status as printed by the `status` command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: TimerStatus,
    pub phase: Phase,
    pub remaining: String,
    pub remaining_ms: u64,
    pub stop_at_utc: Option<DateTime<Utc>>,
    pub cycle_count: u64,
    pub completed_sessions: usize,
}

impl StatusReport {
    /// Capture the engine's current state
    pub fn capture(engine: &TimerEngine, completed_sessions: usize) -> Self {
        let remaining = engine.remaining_time();
        Self {
            status: engine.status(),
            phase: engine.current_phase(),
            remaining: format_clock(remaining),
            remaining_ms: u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
            stop_at_utc: engine.stop_at_utc(),
            cycle_count: engine.cycle_count(),
            completed_sessions,
        }
    }
}
