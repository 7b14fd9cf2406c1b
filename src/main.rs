//! RAX Chat Server - Entry Point
//!
//! A line-oriented chat relay: clients identify with `HELLO|<name>` and
//! exchange direct messages through the server.

use log::info;

use rax_chat_server::error::{ChatServerError, handle_error};
use rax_chat_server::{Server, ServerConfig};

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    info!("Launching chat server...");

    if let Err(e) = run().await {
        handle_error(&e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ChatServerError> {
    let config = ServerConfig::load()?;
    let server = Server::new(config).await?;
    server.start().await;
    Ok(())
}
