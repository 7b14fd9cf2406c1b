//! Chat protocol implementation
//!
//! Handles line framing, command parsing, dispatch and reply encoding.

pub mod commands;
pub mod framer;
pub mod handlers;
pub mod responses;

pub use commands::{Command, CommandResult, CommandStatus, parse_command};
pub use framer::{LineFramer, LineReader};
pub use handlers::{handle_command, process_line};
pub use responses::Reply;
