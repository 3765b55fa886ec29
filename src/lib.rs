//! Cycle Timer - a work/break interval timer engine
//!
//! This library runs Pomodoro-style countdowns that alternate between work
//! and break phases, with pause/resume, skip and cancellation, and publishes
//! every lifecycle transition to subscribers.

pub mod config;
pub mod console;
pub mod engine;
pub mod error;
pub mod notify;
pub mod session;
pub mod state;
pub mod tasks;
pub mod utils;
pub mod waiter;

// Re-export commonly used types
pub use config::{Config, TimerOptions};
pub use engine::TimerEngine;
pub use error::{ConfigError, EngineError, WaiterError};
pub use notify::{EventKind, NotificationEvent, NotificationHub, Subscription};
pub use state::{CyclePlan, Phase, PhaseSpec, TimerState, TimerStatus};
pub use utils::signals::shutdown_signal;
pub use waiter::{Clock, ImmediateClock, MonotonicWaiter, TokioClock, WaitOutcome};
