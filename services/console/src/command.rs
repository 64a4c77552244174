//! Console commands and how they map onto bridge actions.

use crate::view::UiState;
use std::str::FromStr;
use tracing::debug;
use voice_bridge_core::SessionBridge;

pub const HELP: &str = "\
commands:
  connect          connect, or disconnect when already connected
  mic              toggle mute (only while connected)
  say <text>       send a message to the assistant
  transcript       show or hide the latest transcript
  status           print the current snapshot as JSON
  help             show this list
  quit             end the session and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ToggleConnection,
    ToggleMic,
    Say(String),
    ToggleTranscript,
    Status,
    Help,
    Quit,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command: '{0}'. Type `help` for a list.")]
    Unknown(String),
    #[error("`say` needs some text")]
    MissingText,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(w, r)| (w, r.trim()))
            .unwrap_or((line, ""));

        match word.to_lowercase().as_str() {
            "connect" => Ok(Command::ToggleConnection),
            "mic" => Ok(Command::ToggleMic),
            "say" if rest.is_empty() => Err(CommandError::MissingText),
            "say" => Ok(Command::Say(rest.to_string())),
            "transcript" => Ok(Command::ToggleTranscript),
            "status" => Ok(Command::Status),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            _ => Err(CommandError::Unknown(line.to_string())),
        }
    }
}

/// Parses one input line; blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>, CommandError> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    line.parse().map(Some)
}

/// What the shell should do after a command ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to draw; any snapshot change arrives through the bridge.
    Done,
    /// Presentation-only state changed and the frame must be redrawn.
    Redraw,
    /// The control is disabled in the current state.
    Disabled(&'static str),
    Print(String),
    Quit,
}

/// Runs `command` against the bridge.
pub async fn dispatch(bridge: &SessionBridge, ui: &mut UiState, command: Command) -> Outcome {
    debug!(?command, "Dispatching command");
    match command {
        Command::ToggleConnection => {
            if !bridge.is_initialized() {
                return Outcome::Disabled("connect is unavailable until the client is initialized");
            }
            if bridge.state().connected {
                bridge.disconnect().await;
            } else {
                bridge.connect().await;
            }
            Outcome::Done
        }
        Command::ToggleMic => {
            if !bridge.state().connected {
                return Outcome::Disabled("mic is available once connected");
            }
            bridge.toggle_mute().await;
            Outcome::Done
        }
        Command::Say(text) => {
            bridge.send_message(text).await;
            Outcome::Done
        }
        Command::ToggleTranscript => {
            if bridge.state().transcript.is_empty() {
                return Outcome::Disabled("no transcript yet");
            }
            ui.show_transcript = !ui.show_transcript;
            Outcome::Redraw
        }
        Command::Status => match serde_json::to_string(&bridge.state()) {
            Ok(json) => Outcome::Print(json),
            Err(e) => Outcome::Print(format!("failed to serialize state: {}", e)),
        },
        Command::Help => Outcome::Print(HELP.to_string()),
        Command::Quit => Outcome::Quit,
    }
}
