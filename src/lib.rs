//! RAX Chat Server
//!
//! A line-oriented multi-client chat relay over TCP.

pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod server;

pub use config::ServerConfig;
pub use server::Server;
