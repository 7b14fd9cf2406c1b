//! Error handlers
//!
//! Logging helpers for errors that end a connection or the process.

use crate::error::types::ChatServerError;
use log::{error, info, warn};
use std::io;
use std::net::SocketAddr;

/// Handle a chat server error
pub fn handle_error(err: &ChatServerError) {
    error!("Chat Server Error: {}", err);
}

/// Log an I/O fault that terminated a single connection.
///
/// Peer hang-ups are routine and stay at `info`; anything else is a `warn`.
pub fn log_connection_fault(peer_addr: SocketAddr, err: &io::Error) {
    match err.kind() {
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::UnexpectedEof => {
            info!("Connection to {} dropped: {}", peer_addr, err);
        }
        _ => warn!("I/O error on connection {}: {}", peer_addr, err),
    }
}
