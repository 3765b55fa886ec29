//! Work/break cycle configuration and the completed-phase cursor

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::Phase;
use crate::error::ConfigError;

/// Default length of a work phase
pub const DEFAULT_WORK_DURATION: Duration = Duration::from_secs(25 * 60);
/// Default length of a break phase
pub const DEFAULT_BREAK_DURATION: Duration = Duration::from_secs(5 * 60);

/// One entry of a cycle: which phase and for how long
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSpec {
    pub phase: Phase,
    pub duration: Duration,
}

impl PhaseSpec {
    pub fn new(phase: Phase, duration: Duration) -> Self {
        Self { phase, duration }
    }
}

/// Ordered, cyclic sequence of phases plus the count of completed phases.
///
/// The sequence is fixed at construction and never empty; only the cursor
/// moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclePlan {
    sequence: Vec<PhaseSpec>,
    cycle_count: u64,
}

impl CyclePlan {
    /// Build a plan from an explicit sequence.
    ///
    /// Zero durations are legal and complete immediately. Durations too large
    /// to be added to a wall-clock timestamp are rejected.
    pub fn new(sequence: Vec<PhaseSpec>) -> Result<Self, ConfigError> {
        if sequence.is_empty() {
            return Err(ConfigError::EmptyPlan);
        }
        for spec in &sequence {
            if chrono::Duration::from_std(spec.duration).is_err() {
                return Err(ConfigError::DurationOutOfRange {
                    phase: spec.phase,
                    duration: spec.duration,
                });
            }
        }
        Ok(Self {
            sequence,
            cycle_count: 0,
        })
    }

    /// Two-phase plan alternating work and break, beginning with `start`
    pub fn work_break(
        work: Duration,
        brk: Duration,
        start: Phase,
    ) -> Result<Self, ConfigError> {
        let work = PhaseSpec::new(Phase::Work, work);
        let brk = PhaseSpec::new(Phase::Break, brk);
        let sequence = match start {
            Phase::Work => vec![work, brk],
            Phase::Break => vec![brk, work],
        };
        Self::new(sequence)
    }

    /// Phase and duration for a given completed-phase count
    pub fn phase_for(&self, cycle_count: u64) -> PhaseSpec {
        let index = cycle_count % self.sequence.len() as u64;
        self.sequence[index as usize]
    }

    /// Phase the cursor currently points at
    pub fn current(&self) -> PhaseSpec {
        self.phase_for(self.cycle_count)
    }

    /// Record one completed phase
    pub fn next(&mut self) {
        self.cycle_count = self.cycle_count.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.cycle_count = 0;
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

impl Default for CyclePlan {
    fn default() -> Self {
        Self {
            sequence: vec![
                PhaseSpec::new(Phase::Work, DEFAULT_WORK_DURATION),
                PhaseSpec::new(Phase::Break, DEFAULT_BREAK_DURATION),
            ],
            cycle_count: 0,
        }
    }
}
