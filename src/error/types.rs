//! Error types
//!
//! Defines domain-specific error types for each module of the chat server.

use std::fmt;
use std::io;

/// Client input that does not fit the protocol.
///
/// The `Display` text is exactly what follows `ERR|` on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    MissingHello,
    EmptyName,
    NameTaken,
    MalformedSend,
    UnknownCommand,
    LineTooLong,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::MissingHello => write!(f, "First message must be HELLO|<name>"),
            ProtocolError::EmptyName => write!(f, "Name cannot be empty"),
            ProtocolError::NameTaken => write!(f, "Name already in use"),
            ProtocolError::MalformedSend => write!(f, "Format: SEND|<to>|<message>"),
            ProtocolError::UnknownCommand => {
                write!(f, "Unknown command. Use LIST, SEND|to|msg, QUIT")
            }
            ProtocolError::LineTooLong => write!(f, "Line too long"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Client registry errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    NameTaken(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::NameTaken(name) => write!(f, "Name already registered: {}", name),
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<RegistryError> for ProtocolError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::NameTaken(_) => ProtocolError::NameTaken,
        }
    }
}

/// Line framing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    LineTooLong { buffered: usize, limit: usize },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::LineTooLong { buffered, limit } => write!(
                f,
                "{} bytes buffered without a line break (limit {})",
                buffered, limit
            ),
        }
    }
}

impl std::error::Error for FrameError {}

impl From<FrameError> for io::Error {
    fn from(error: FrameError) -> Self {
        io::Error::new(io::ErrorKind::InvalidData, error)
    }
}

/// Top-level server errors
#[derive(Debug)]
pub enum ChatServerError {
    Config(config::ConfigError),
    Bind(String, io::Error),
    InvalidAddress(String),
}

impl fmt::Display for ChatServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatServerError::Config(e) => write!(f, "Configuration error: {}", e),
            ChatServerError::Bind(addr, e) => write!(f, "Failed to bind to {}: {}", addr, e),
            ChatServerError::InvalidAddress(addr) => write!(f, "Invalid bind address: {}", addr),
        }
    }
}

impl std::error::Error for ChatServerError {}

impl From<config::ConfigError> for ChatServerError {
    fn from(error: config::ConfigError) -> Self {
        ChatServerError::Config(error)
    }
}
