//! Line parser for the interactive remote.

use cadence_server::{
    domain::{PlaybackCommand, TransportStatus},
    infrastructure::dto::websocket::PlaybackStateDto,
};
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  play | pause | next | prev       send a remote-control command
  seek <seconds>                   jump to a position
  state playing|paused <pos> [title]
                                   report a local playback snapshot
  status                           show the connection status
  help                             show this message
  quit                             disconnect and exit";

/// One parsed line of user input
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Command(PlaybackCommand),
    State(PlaybackStateDto),
    Status,
    Help,
    Quit,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Unknown input '{0}' (type 'help' for usage)")]
    Unknown(String),

    #[error("{0}")]
    Invalid(String),
}

pub fn parse_input(line: &str) -> Result<Input, InputError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(Input::Empty);
    };

    match head {
        "play" | "pause" | "next" | "previous" => command(head, None),
        "prev" => command("previous", None),
        "seek" => {
            let seconds = words
                .next()
                .ok_or_else(|| InputError::Invalid("Usage: seek <seconds>".to_string()))
                .and_then(seconds)?;
            command("seek", Some(seconds))
        }
        "state" => {
            let usage = || InputError::Invalid("Usage: state playing|paused <pos> [title]".to_string());
            let status = words
                .next()
                .ok_or_else(usage)?
                .parse::<TransportStatus>()
                .map_err(|e| InputError::Invalid(e.to_string()))?;
            let position = words.next().ok_or_else(usage).and_then(seconds)?;
            let title = words.collect::<Vec<_>>().join(" ");
            Ok(Input::State(PlaybackStateDto {
                is_playing: status.is_playing(),
                current_time: position,
                title,
                ..Default::default()
            }))
        }
        "status" => Ok(Input::Status),
        "help" | "?" => Ok(Input::Help),
        "quit" | "exit" => Ok(Input::Quit),
        other => Err(InputError::Unknown(other.to_string())),
    }
}

fn command(name: &str, value: Option<f64>) -> Result<Input, InputError> {
    PlaybackCommand::parse(name, value)
        .map(Input::Command)
        .map_err(|e| InputError::Invalid(e.to_string()))
}

fn seconds(raw: &str) -> Result<f64, InputError> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(InputError::Invalid(format!(
            "'{raw}' is not a valid number of seconds"
        ))),
    }
}
