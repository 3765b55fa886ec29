//! Console command parsing

use std::str::FromStr;

use crate::error::CommandError;

/// A line typed at the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Start,
    Pause,
    Resume,
    Skip,
    Cancel,
    Reset,
    Status,
    Help,
    Quit,
}

impl ConsoleCommand {
    pub const HELP: &'static str = "\
Commands:
  start   - start (or restart) the current phase
  pause   - pause the countdown
  resume  - resume a paused countdown
  skip    - finish the current phase now
  cancel  - stop the timer
  reset   - stop the timer and return to the first phase
  status  - print the timer state as JSON
  help    - show this list
  quit    - exit";
}

impl FromStr for ConsoleCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let word = line.trim().to_ascii_lowercase();
        match word.as_str() {
            "" => Err(CommandError::Empty),
            "start" | "s" => Ok(Self::Start),
            "pause" | "p" => Ok(Self::Pause),
            "resume" | "r" => Ok(Self::Resume),
            "skip" | "n" => Ok(Self::Skip),
            "cancel" | "stop" | "c" => Ok(Self::Cancel),
            "reset" => Ok(Self::Reset),
            "status" | "?" => Ok(Self::Status),
            "help" | "h" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            _ => Err(CommandError::Unknown(line.trim().to_string())),
        }
    }
}
