//! Timer state structure and remaining-time bookkeeping

use std::{fmt, str::FromStr, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::ConfigError;

/// One timed segment of the cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Work => "Work",
            Phase::Break => "Break",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "work" => Ok(Phase::Work),
            "break" => Ok(Phase::Break),
            _ => Err(ConfigError::UnknownPhase(s.to_string())),
        }
    }
}

/// Lifecycle status of a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Stopped,
    Running,
    Paused,
}

/// Authoritative state of one timer.
///
/// `remaining` is only meaningful together with `last_transition_at`: while
/// Running it holds the time that was left at the last transition, and the
/// live value is derived with [`TimerState::compute_remaining_now`].
#[derive(Debug, Clone, PartialEq)]
pub struct TimerState {
    pub status: TimerStatus,
    pub phase: Phase,
    /// Configured length of the current phase
    pub total_duration: Duration,
    /// Time left in the current phase as of `last_transition_at`
    pub remaining: Duration,
    /// Monotonic timestamp of the last start, pause or resume
    pub last_transition_at: Instant,
    /// Wall-clock time the timer last stopped or paused
    pub halted_at_utc: Option<DateTime<Utc>>,
}

impl TimerState {
    /// Create a stopped timer with nothing left on the clock
    pub fn new(phase: Phase, now: Instant) -> Self {
        Self {
            status: TimerStatus::Stopped,
            phase,
            total_duration: Duration::ZERO,
            remaining: Duration::ZERO,
            last_transition_at: now,
            halted_at_utc: None,
        }
    }

    /// Remaining time at `now`.
    ///
    /// Time only advances while Running; the result is clamped to
    /// `[0, total_duration]`.
    pub fn compute_remaining_now(&self, now: Instant) -> Duration {
        let remaining = match self.status {
            TimerStatus::Running => {
                let elapsed = now.saturating_duration_since(self.last_transition_at);
                self.remaining.saturating_sub(elapsed)
            }
            TimerStatus::Paused | TimerStatus::Stopped => self.remaining,
        };
        remaining.min(self.total_duration)
    }

    /// Fresh state for a new phase with the full duration on the clock.
    ///
    /// The status is carried over; callers decide whether the phase runs.
    pub fn with_phase_reset(&self, phase: Phase, duration: Duration, now: Instant) -> Self {
        Self {
            status: self.status,
            phase,
            total_duration: duration,
            remaining: duration,
            last_transition_at: now,
            halted_at_utc: self.halted_at_utc,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn is_paused(&self) -> bool {
        self.status == TimerStatus::Paused
    }

    pub fn is_stopped(&self) -> bool {
        self.status == TimerStatus::Stopped
    }
}

/// Read-only view of an engine published after every mutation
#[derive(Debug, Clone, PartialEq)]
pub struct TimerSnapshot {
    pub state: TimerState,
    /// Number of phases completed so far
    pub cycle_count: u64,
}

impl TimerSnapshot {
    /// Remaining time at `now`
    pub fn remaining_at(&self, now: Instant) -> Duration {
        self.state.compute_remaining_now(now)
    }

    /// Projected end of the phase while Running, otherwise the moment the
    /// timer was stopped or paused.
    pub fn stop_at_utc(&self, now: Instant) -> Option<DateTime<Utc>> {
        if !self.state.is_running() {
            return self.state.halted_at_utc;
        }
        let remaining = chrono::Duration::from_std(self.remaining_at(now)).ok()?;
        Utc::now().checked_add_signed(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn running(total_ms: u64, remaining_ms: u64, at: Instant) -> TimerState {
        TimerState {
            status: TimerStatus::Running,
            phase: Phase::Work,
            total_duration: Duration::from_millis(total_ms),
            remaining: Duration::from_millis(remaining_ms),
            last_transition_at: at,
            halted_at_utc: None,
        }
    }

    #[test]
    fn new_state_is_stopped_and_empty() {
        let state = TimerState::new(Phase::Work, Instant::now());
        assert!(state.is_stopped());
        assert_eq!(state.remaining, Duration::ZERO);
        assert_eq!(state.halted_at_utc, None);
    }

    #[test]
    fn running_state_counts_down() {
        let start = Instant::now();
        let state = running(100, 100, start);
        let now = start + Duration::from_millis(30);
        assert_eq!(state.compute_remaining_now(now), Duration::from_millis(70));
    }

    #[test]
    fn running_state_clamps_at_zero() {
        let start = Instant::now();
        let state = running(100, 100, start);
        let now = start + Duration::from_secs(5);
        assert_eq!(state.compute_remaining_now(now), Duration::ZERO);
    }

    #[test]
    fn paused_state_does_not_advance() {
        let start = Instant::now();
        let mut state = running(100, 40, start);
        state.status = TimerStatus::Paused;
        let now = start + Duration::from_secs(60);
        assert_eq!(state.compute_remaining_now(now), Duration::from_millis(40));
    }

    #[test]
    fn phase_reset_fills_the_clock() {
        let start = Instant::now();
        let state = running(100, 3, start);
        let later = start + Duration::from_millis(500);
        let next = state.with_phase_reset(Phase::Break, Duration::from_millis(50), later);
        assert_eq!(next.phase, Phase::Break);
        assert_eq!(next.total_duration, Duration::from_millis(50));
        assert_eq!(next.remaining, Duration::from_millis(50));
        assert_eq!(next.last_transition_at, later);
        assert_eq!(next.status, TimerStatus::Running);
    }

    #[test]
    fn phase_parses_case_insensitively() {
        assert_eq!("WORK".parse::<Phase>().unwrap(), Phase::Work);
        assert_eq!(" break ".parse::<Phase>().unwrap(), Phase::Break);
        assert!(matches!("lunch".parse::<Phase>(), Err(ConfigError::UnknownPhase(_))));
    }

    #[test]
    fn stopped_snapshot_reports_halt_time() {
        let now = Instant::now();
        let halted = Utc::now();
        let mut state = TimerState::new(Phase::Work, now);
        state.halted_at_utc = Some(halted);
        let snapshot = TimerSnapshot { state, cycle_count: 0 };
        assert_eq!(snapshot.stop_at_utc(now), Some(halted));
    }

    #[test]
    fn running_snapshot_projects_stop_time() {
        let now = Instant::now();
        let snapshot = TimerSnapshot {
            state: running(60_000, 60_000, now),
            cycle_count: 0,
        };
        let before = Utc::now();
        let stop_at = snapshot.stop_at_utc(now).unwrap();
        assert!(stop_at >= before + chrono::Duration::seconds(59));
    }

    proptest! {
        #[test]
        fn remaining_stays_within_bounds(
            total in 0u64..10_000,
            remaining in 0u64..20_000,
            elapsed in 0u64..30_000,
        ) {
            let start = Instant::now();
            let state = running(total, remaining, start);
            let left = state.compute_remaining_now(start + Duration::from_millis(elapsed));
            prop_assert!(left <= state.total_duration);
        }

        #[test]
        fn remaining_never_increases_while_running(
            total in 1u64..10_000,
            first in 0u64..10_000,
            second in 0u64..10_000,
        ) {
            let start = Instant::now();
            let state = running(total, total, start);
            let (a, b) = (first.min(second), first.max(second));
            let earlier = state.compute_remaining_now(start + Duration::from_millis(a));
            let later = state.compute_remaining_now(start + Duration::from_millis(b));
            prop_assert!(later <= earlier);
        }
    }
}
