//! Client management system
//!
//! Handles client connections, the shared name registry, and the
//! per-connection session lifecycle.

pub mod connection;
pub mod handler;
pub mod registry;

pub use connection::ClientConnection;
pub use handler::{SessionState, handle_client};
pub use registry::{ClientRecord, ClientRegistry};
