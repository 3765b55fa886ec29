//! State management module
//!
//! This module contains the timer state, its phases and the cycle plan that
//! decides which phase runs next.

pub mod cycle_plan;
pub mod timer_state;

// Re-export main types
pub use cycle_plan::{CyclePlan, PhaseSpec, DEFAULT_BREAK_DURATION, DEFAULT_WORK_DURATION};
pub use timer_state::{Phase, TimerSnapshot, TimerState, TimerStatus};
