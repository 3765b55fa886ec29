//! Configuration and CLI argument handling

use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    state::{CyclePlan, Phase, DEFAULT_BREAK_DURATION, DEFAULT_WORK_DURATION},
};

/// Default spacing of Tick events
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Options recognised by the timer engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerOptions {
    pub work_duration: Duration,
    pub break_duration: Duration,
    /// Phase the cycle begins with, and returns to on reset
    pub start_phase: Phase,
    /// Spacing of Tick events while running; `None` disables them
    pub tick_interval: Option<Duration>,
}

impl TimerOptions {
    /// Build the validated cycle plan for these options
    pub fn cycle_plan(&self) -> Result<CyclePlan, ConfigError> {
        CyclePlan::work_break(self.work_duration, self.break_duration, self.start_phase)
    }

    /// Tick interval, rejecting zero
    pub fn validated_tick_interval(&self) -> Result<Option<Duration>, ConfigError> {
        match self.tick_interval {
            Some(period) if period.is_zero() => Err(ConfigError::ZeroTickInterval),
            other => Ok(other),
        }
    }

    /// Check everything the engine will check at construction
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cycle_plan()?;
        self.validated_tick_interval()?;
        Ok(())
    }
}

impl Default for TimerOptions {
    fn default() -> Self {
        Self {
            work_duration: DEFAULT_WORK_DURATION,
            break_duration: DEFAULT_BREAK_DURATION,
            start_phase: Phase::Work,
            tick_interval: Some(DEFAULT_TICK_INTERVAL),
        }
    }
}

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "cycle-timer")]
#[command(about = "A work/break interval timer driven from the terminal")]
#[command(version)]
pub struct Config {
    /// Length of a work phase (e.g. 25m, 90s, 1500ms)
    #[arg(short, long, default_value = "25m", value_parser = humantime::parse_duration)]
    pub work: Duration,

    /// Length of a break phase
    #[arg(short = 'b', long = "break", default_value = "5m", value_parser = humantime::parse_duration)]
    pub break_duration: Duration,

    /// Phase to begin the cycle with (work or break)
    #[arg(short, long, default_value = "work", value_parser = parse_phase)]
    pub start_phase: Phase,

    /// Interval between countdown ticks
    #[arg(long, default_value = "1s", value_parser = humantime::parse_duration)]
    pub tick: Duration,

    /// Do not emit countdown ticks
    #[arg(long)]
    pub no_tick: bool,

    /// Start the first phase immediately
    #[arg(short, long)]
    pub autostart: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Engine options described by these arguments
    pub fn timer_options(&self) -> TimerOptions {
        TimerOptions {
            work_duration: self.work,
            break_duration: self.break_duration,
            start_phase: self.start_phase,
            tick_interval: (!self.no_tick).then_some(self.tick),
        }
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

fn parse_phase(value: &str) -> Result<Phase, ConfigError> {
    value.parse()
}
