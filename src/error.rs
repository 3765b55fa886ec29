//! Error types for the timer engine.
//!
//! Ordinary state races (double cancel, pause while paused, ...) are not
//! errors and never show up here. Only misconfiguration, waiter failures and
//! a vanished engine task are reported.

use std::time::Duration;
use thiserror::Error;

use crate::state::Phase;

/// Configuration rejected at construction time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A cycle plan needs at least one phase
    #[error("cycle plan must contain at least one phase")]
    EmptyPlan,

    /// Duration too large to be expressed as a wall-clock offset
    #[error("{phase} duration {duration:?} is out of range")]
    DurationOutOfRange { phase: Phase, duration: Duration },

    /// Tick interval of zero would spin the engine loop
    #[error("tick interval must be greater than zero")]
    ZeroTickInterval,

    #[error("unknown phase '{0}', expected 'work' or 'break'")]
    UnknownPhase(String),
}

/// Failures of a [`MonotonicWaiter`](crate::waiter::MonotonicWaiter).
///
/// Cancellation is not a failure; it is reported as
/// [`WaitOutcome::Cancelled`](crate::waiter::WaitOutcome::Cancelled).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WaiterError {
    /// The one-shot waiter was already consumed
    #[error("waiter has already been used and is disposed")]
    Disposed,

    /// The underlying timer failed
    #[error("timer fault: {0}")]
    Fault(String),
}

/// Errors returned by [`TimerEngine`](crate::engine::TimerEngine) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("timer engine task is no longer running")]
    Closed,
}

/// Console command parsing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}', type 'help' for a list of commands")]
    Unknown(String),
}
