//! Error handling
//!
//! Defines error types and handling for the chat server.

pub mod handlers;
pub mod types;

pub use handlers::{handle_error, log_connection_fault};
pub use types::*;
