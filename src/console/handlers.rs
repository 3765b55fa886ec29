//! Console command handlers

use std::ops::ControlFlow;

use tracing::{error, info};

use super::{commands::ConsoleCommand, responses::StatusReport};
use crate::{
    engine::TimerEngine,
    error::EngineError,
    notify::{EventKind, NotificationEvent},
    session::MemorySessionLog,
    utils::format_clock,
};

/// Apply one console command to the engine.
///
/// Returns `Break` when the console should stop reading input.
pub async fn dispatch(
    engine: &TimerEngine,
    sessions: &MemorySessionLog,
    command: ConsoleCommand,
) -> Result<ControlFlow<()>, EngineError> {
    match command {
        ConsoleCommand::Start => engine.start().await?,
        ConsoleCommand::Pause => engine.pause().await?,
        ConsoleCommand::Resume => engine.resume().await?,
        ConsoleCommand::Skip => engine.skip().await?,
        ConsoleCommand::Cancel => engine.cancel().await?,
        ConsoleCommand::Reset => engine.reset().await?,
        ConsoleCommand::Status => {
            let report = StatusReport::capture(engine, sessions.len());
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => error!("Failed to render status: {}", e),
            }
        }
        ConsoleCommand::Help => println!("{}", ConsoleCommand::HELP),
        ConsoleCommand::Quit => {
            info!("Quit requested");
            return Ok(ControlFlow::Break(()));
        }
    }
    Ok(ControlFlow::Continue(()))
}

/// Log one engine event for the console user
pub async fn log_event(event: NotificationEvent) -> anyhow::Result<()> {
    match event.kind {
        EventKind::Tick => {
            tracing::debug!("{} {} remaining", event.phase, format_clock(event.remaining))
        }
        EventKind::TimerFault => error!(
            "{} phase stopped by timer fault: {}",
            event.phase,
            event.fault.as_deref().unwrap_or("unknown")
        ),
        kind => info!(
            "{:?}: {} phase, {} remaining, {} phases completed",
            kind,
            event.phase,
            format_clock(event.remaining),
            event.cycle_count
        ),
    }
    Ok(())
}
