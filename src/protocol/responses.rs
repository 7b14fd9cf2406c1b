//! Server replies
//!
//! Every line the server writes carries a category tag. `Display` renders
//! the line without its terminating newline.

use std::fmt;

use crate::error::ProtocolError;

pub const WELCOME: &str = "Welcome. Identify with: HELLO|<your_name>";
pub const HELP: &str = "Commands: LIST, SEND|to|msg, QUIT";

/// A single server-to-client line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Sys(String),
    Ok(String),
    Err(String),
    Users(Vec<String>),
    From { sender: String, body: String },
}

impl Reply {
    pub fn welcome() -> Self {
        Reply::Sys(WELCOME.to_string())
    }

    pub fn help() -> Self {
        Reply::Sys(HELP.to_string())
    }

    pub fn connected(name: &str) -> Self {
        Reply::Sys(format!("{} connected", name))
    }

    pub fn disconnected(name: &str) -> Self {
        Reply::Sys(format!("{} disconnected", name))
    }

    pub fn registered(name: &str) -> Self {
        Reply::Ok(format!("Registered as {}", name))
    }

    pub fn bye() -> Self {
        Reply::Ok("Bye".to_string())
    }

    pub fn sent_to(to: &str) -> Self {
        Reply::Ok(format!("Sent to {}", to))
    }

    pub fn user_not_found(to: &str) -> Self {
        Reply::Err(format!("User '{}' not found", to))
    }

    pub fn delivery_failed(to: &str) -> Self {
        Reply::Err(format!("Failed to deliver to {}", to))
    }
}

impl From<ProtocolError> for Reply {
    fn from(error: ProtocolError) -> Self {
        Reply::Err(error.to_string())
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Sys(text) => write!(f, "SYS|{}", text),
            Reply::Ok(text) => write!(f, "OK|{}", text),
            Reply::Err(text) => write!(f, "ERR|{}", text),
            Reply::Users(names) => write!(f, "USERS|{}", names.join(",")),
            Reply::From { sender, body } => write!(f, "FROM|{}|{}", sender, body),
        }
    }
}
