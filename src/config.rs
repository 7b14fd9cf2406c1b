//! Configuration management for RAX Chat Server
//!
//! Values are layered: built-in defaults, then an optional `config.toml`,
//! then `RAX_CHAT_*` environment overrides. All of them require a restart.

use config::{Config, Environment, File};
use serde::Deserialize;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_BACKLOG: u32 = 50;
const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Server configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// IP address the listener binds to
    /// Environment: RAX_CHAT_BIND_ADDRESS
    pub bind_address: String,

    /// TCP port for client connections
    /// Environment: RAX_CHAT_PORT
    pub port: u16,

    /// Pending-connection queue depth passed to listen(2)
    /// Environment: RAX_CHAT_BACKLOG
    pub backlog: u32,

    /// Bytes buffered without a newline before a connection is dropped (0 = no limit)
    /// Environment: RAX_CHAT_MAX_LINE_LENGTH
    pub max_line_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            backlog: DEFAULT_BACKLOG,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl ServerConfig {
    /// Load configuration from defaults, `config.toml` and the environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("backlog", i64::from(DEFAULT_BACKLOG))?
            .set_default("max_line_length", DEFAULT_MAX_LINE_LENGTH as i64)?
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("RAX_CHAT"))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.bind_address.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "bind_address cannot be empty".into(),
            ));
        }

        if self.backlog == 0 {
            return Err(config::ConfigError::Message(
                "backlog must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Get bind address and port as a socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Line bound handed to the framer, `None` when disabled
    pub fn line_limit(&self) -> Option<usize> {
        (self.max_line_length > 0).then_some(self.max_line_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.socket_addr(), "0.0.0.0:5000");
        assert_eq!(config.line_limit(), Some(65536));
    }

    #[test]
    fn test_zero_backlog_rejected() {
        let config = ServerConfig {
            backlog: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_bind_address_rejected() {
        let config = ServerConfig {
            bind_address: "  ".into(),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_line_length_disables_limit() {
        let config = ServerConfig {
            max_line_length: 0,
            ..ServerConfig::default()
        };
        assert_eq!(config.line_limit(), None);
    }
}
