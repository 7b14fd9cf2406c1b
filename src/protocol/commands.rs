//! Module `commands`
//!
//! Defines the client-to-server protocol messages and the single parsing
//! step that turns a received line into one of them.

use crate::error::ProtocolError;
use crate::protocol::Reply;

/// A message sent by a client, parsed from one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Hello(String),
    List,
    Send { to: String, body: String },
    Quit,
}

/// Represents the outcome status of executing a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Struct encapsulating the full result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub message: Option<Reply>,
}

/// Parses one received line.
///
/// Tags are case-sensitive. Only the first two `|` in a `SEND` line are
/// separators; the body is kept as-is.
pub fn parse_command(raw: &str) -> Result<Command, ProtocolError> {
    let line = raw.trim();

    match line {
        "QUIT" => return Ok(Command::Quit),
        "LIST" => return Ok(Command::List),
        _ => {}
    }

    if let Some(name) = line.strip_prefix("HELLO|") {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProtocolError::EmptyName);
        }
        return Ok(Command::Hello(name.to_string()));
    }

    if line.starts_with("SEND|") {
        let mut parts = line.splitn(3, '|').skip(1);
        return match (parts.next(), parts.next()) {
            (Some(to), Some(body)) => Ok(Command::Send {
                to: to.trim().to_string(),
                body: body.to_string(),
            }),
            _ => Err(ProtocolError::MalformedSend),
        };
    }

    Err(ProtocolError::UnknownCommand)
}
