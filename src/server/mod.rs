//! Server core functionality
//!
//! This module contains the listener that accepts client connections and
//! hands each one to its own session task.

pub mod core;

pub use core::Server;
