//! Line-based chat surface: command parsing and transcript rendering.

use std::fmt::Write as _;

use nutribot_core::types::{PlaybackStatus, PreferredLanguage, Role, Turn, TurnId};

pub const HELP: &str = "\
Type a question in English, Hindi or Telugu and press enter.
  /lang auto|en|hi|te   reply language (auto follows what you type)
  /speak [n]            read reply #n aloud, or the latest one; again to stop
  /new                  start a new chat
  /history              show the conversation so far
  /quit                 exit";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command /{0} (try /help)")]
    Unknown(String),
    #[error("/{command}: {message}")]
    InvalidArgument { command: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Free text to send as a turn.
    Say(String),
    Language(PreferredLanguage),
    /// Toggle read-aloud for a turn, or the latest reply.
    Speak(Option<TurnId>),
    New,
    History,
    Help,
    Quit,
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>, CommandError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Ok(Some(Command::Say(line.trim_end_matches(['\r', '\n']).to_string())));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();

    let command = match name {
        "lang" | "language" => {
            let value = arg.ok_or_else(|| CommandError::InvalidArgument {
                command: "lang",
                message: "expected auto, en, hi or te".to_string(),
            })?;
            let preferred = value.parse().map_err(|e: nutribot_core::NutribotError| {
                CommandError::InvalidArgument {
                    command: "lang",
                    message: e.to_string(),
                }
            })?;
            Command::Language(preferred)
        }
        "speak" => match arg {
            None => Command::Speak(None),
            Some(value) => {
                let n = value
                    .trim_start_matches('#')
                    .parse::<u64>()
                    .map_err(|_| CommandError::InvalidArgument {
                        command: "speak",
                        message: format!("{} is not a reply number", value),
                    })?;
                Command::Speak(Some(TurnId(n)))
            }
        },
        "new" | "reset" => Command::New,
        "history" => Command::History,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

/// Render a turn for the terminal.
///
/// Assistant turns list their citations and the read-aloud control label.
pub fn render_turn(turn: &Turn, playback: PlaybackStatus) -> String {
    let mut out = String::new();
    match turn.role {
        Role::User => {
            let _ = write!(out, "{} you: {}", turn.id, turn.content);
        }
        Role::Assistant => {
            let _ = write!(
                out,
                "{} nutribot [{}]: {}",
                turn.id,
                turn.effective_language(),
                turn.content
            );
            if !turn.sources.is_empty() {
                let titles: Vec<&str> = turn.sources.iter().map(|s| s.display_title()).collect();
                let _ = write!(out, "\n    Sources: {}", titles.join(", "));
            }
            let _ = write!(out, "\n    [{}: /speak {}]", playback.control_label(), turn.id.0);
        }
    }
    out
}
