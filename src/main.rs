//! Cycle Timer - a work/break interval timer driven from the terminal
//!
//! This is the main entry point for the cycle-timer application.

use std::sync::Arc;

use tracing::info;

use cycle_timer::{
    config::Config,
    console::{log_event, serve, stdin_lines},
    engine::TimerEngine,
    session::{record_sessions, MemorySessionLog},
    utils::{format_clock, shutdown_signal},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("cycle_timer={}", config.log_level()))
        .init();

    let options = config.timer_options();
    info!("Starting cycle-timer v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: work={}, break={}, start={}",
        format_clock(options.work_duration),
        format_clock(options.break_duration),
        options.start_phase
    );

    let engine = TimerEngine::new(options)?;
    let sessions = MemorySessionLog::new();
    let _events = engine.subscribe(log_event);
    let _recorder = record_sessions(engine.hub(), Arc::new(sessions.clone()));

    if config.autostart {
        engine.start().await?;
    }

    serve(&engine, &sessions, stdin_lines(), shutdown_signal()).await?;
    info!("Completed {} work sessions", sessions.len());
    info!("Shutdown complete");
    Ok(())
}
