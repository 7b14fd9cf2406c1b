use log::{error, info};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpSocket};

use crate::client::{ClientRegistry, handle_client};
use crate::config::ServerConfig;
use crate::error::ChatServerError;

pub struct Server {
    client_registry: Arc<ClientRegistry>,
    listener: TcpListener,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Binds the listening socket. Failure here is the only fatal error.
    pub async fn new(config: ServerConfig) -> Result<Self, ChatServerError> {
        let socket_addr = config.socket_addr();

        let addr = tokio::net::lookup_host(socket_addr.as_str())
            .await
            .map_err(|e| ChatServerError::Bind(socket_addr.clone(), e))?
            .next()
            .ok_or_else(|| ChatServerError::InvalidAddress(socket_addr.clone()))?;

        let listener = match bind_listener(addr, config.backlog) {
            Ok(listener) => {
                info!("Server bound to {} (backlog {})", addr, config.backlog);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", addr, e);
                return Err(ChatServerError::Bind(socket_addr, e));
            }
        };

        Ok(Self {
            client_registry: Arc::new(ClientRegistry::new()),
            listener,
            config: Arc::new(config),
        })
    }

    /// Address actually bound; differs from the config when port 0 was requested.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn registry(&self) -> Arc<ClientRegistry> {
        Arc::clone(&self.client_registry)
    }

    /// Accepts connections forever.
    pub async fn start(&self) {
        info!("Starting Rax chat server on {}", self.config.socket_addr());

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let client_registry = Arc::clone(&self.client_registry);
                    let config = Arc::clone(&self.config);

                    // Spawn a task for each client so accept loop doesn't block
                    tokio::spawn(handle_client(stream, addr, client_registry, config));
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}

fn bind_listener(addr: SocketAddr, backlog: u32) -> io::Result<TcpListener> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(backlog)
}
