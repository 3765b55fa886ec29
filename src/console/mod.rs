//! Interactive console
//!
//! Reads one command per line from stdin and applies it to a timer engine.

pub mod commands;
pub mod handlers;
pub mod responses;

use std::{future::Future, io::BufRead, ops::ControlFlow};

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::{engine::TimerEngine, session::MemorySessionLog};

pub use commands::ConsoleCommand;
pub use handlers::{dispatch, log_event};
pub use responses::StatusReport;

/// Lines buffered between the stdin thread and the console
const LINE_BUFFER: usize = 16;

/// Lines typed on stdin.
///
/// Reading happens on a plain thread that nothing waits for, so a read that
/// is still blocked never holds up shutdown. The channel closes at end of
/// input.
pub fn stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(LINE_BUFFER);
    let spawned = std::thread::Builder::new()
        .name("console-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
            debug!("Stdin reader finished");
        });

    if let Err(e) = spawned {
        error!("Failed to start stdin reader: {}", e);
    }
    rx
}

/// Apply commands from `lines` until `quit` or the channel closes
pub async fn run_console(
    engine: &TimerEngine,
    sessions: &MemorySessionLog,
    lines: &mut mpsc::Receiver<String>,
) -> anyhow::Result<()> {
    info!("Type 'help' for a list of commands");

    while let Some(line) = lines.recv().await {
        let command = match line.parse::<ConsoleCommand>() {
            Ok(command) => command,
            Err(crate::error::CommandError::Empty) => continue,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };
        if let ControlFlow::Break(()) = dispatch(engine, sessions, command).await? {
            break;
        }
    }

    Ok(())
}

/// Run the console until it ends or `shutdown` resolves, then stop the timer
pub async fn serve<S>(
    engine: &TimerEngine,
    sessions: &MemorySessionLog,
    mut lines: mpsc::Receiver<String>,
    shutdown: S,
) -> anyhow::Result<()>
where
    S: Future<Output = ()>,
{
    tokio::select! {
        result = run_console(engine, sessions, &mut lines) => {
            if let Err(e) = result {
                error!("Console error: {}", e);
            }
        }
        _ = shutdown => {
            info!("Shutdown signal received");
        }
    }

    engine.cancel().await?;
    Ok(())
}
