//! Command handlers for the Rax chat server.
//!
//! Interprets one line from an identified client and carries out its side
//! effects. The reply for the sender is returned in the `CommandResult`; the
//! connection handler writes it.

use log::{info, warn};

use crate::client::ClientRegistry;
use crate::error::ProtocolError;
use crate::protocol::{Command, CommandResult, CommandStatus, Reply, parse_command};

/// Parses and dispatches a line received from `sender`.
pub async fn process_line(sender: &str, line: &str, registry: &ClientRegistry) -> CommandResult {
    match parse_command(line) {
        Ok(command) => handle_command(sender, command, registry).await,
        // HELLO of any shape is only meaningful before identification
        Err(ProtocolError::EmptyName) => handle_protocol_error(ProtocolError::UnknownCommand),
        Err(e) => handle_protocol_error(e),
    }
}

/// Dispatches a parsed command to its handler.
pub async fn handle_command(
    sender: &str,
    command: Command,
    registry: &ClientRegistry,
) -> CommandResult {
    match command {
        Command::Quit => handle_cmd_quit(),
        Command::List => handle_cmd_list(registry).await,
        Command::Send { to, body } => handle_cmd_send(sender, &to, body, registry).await,
        Command::Hello(_) => handle_protocol_error(ProtocolError::UnknownCommand),
    }
}

fn handle_protocol_error(error: ProtocolError) -> CommandResult {
    CommandResult {
        status: CommandStatus::Failure(error.to_string()),
        message: Some(error.into()),
    }
}

fn handle_cmd_quit() -> CommandResult {
    CommandResult {
        status: CommandStatus::CloseConnection,
        message: Some(Reply::bye()),
    }
}

async fn handle_cmd_list(registry: &ClientRegistry) -> CommandResult {
    CommandResult {
        status: CommandStatus::Success,
        message: Some(Reply::Users(registry.snapshot_names().await)),
    }
}

/// Forwards `body` to `to`. A failed delivery leaves the target registered;
/// its own handler cleans up once it sees the fault.
async fn handle_cmd_send(
    sender: &str,
    to: &str,
    body: String,
    registry: &ClientRegistry,
) -> CommandResult {
    let Some(target) = registry.lookup(to).await else {
        return CommandResult {
            status: CommandStatus::Failure(format!("unknown target {}", to)),
            message: Some(Reply::user_not_found(to)),
        };
    };

    let forward = Reply::From {
        sender: sender.to_string(),
        body,
    };

    match target.connection().send(&forward).await {
        Ok(()) => {
            info!("{} -> {}", sender, to);
            CommandResult {
                status: CommandStatus::Success,
                message: Some(Reply::sent_to(to)),
            }
        }
        Err(e) => {
            warn!(
                "Delivery from {} to {} ({}) failed: {}",
                sender,
                to,
                target.peer_addr(),
                e
            );
            CommandResult {
                status: CommandStatus::Failure(e.to_string()),
                message: Some(Reply::delivery_failed(to)),
            }
        }
    }
}
