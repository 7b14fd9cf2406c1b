//! Connection handler
//!
//! Drives one client through `Connected -> Identifying -> Active -> Closed`.
//! Any fault ends only this connection; on the way out the client is
//! unregistered, the others are told, and the socket is closed once.

use log::{debug, info, warn};
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf};

use crate::client::{ClientConnection, ClientRecord, ClientRegistry};
use crate::config::ServerConfig;
use crate::error::{ProtocolError, log_connection_fault};
use crate::protocol::{Command, CommandStatus, LineReader, Reply, parse_command, process_line};

/// Lifecycle of a single connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    Identifying,
    Active(String),
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Connected => write!(f, "CONNECTED"),
            SessionState::Identifying => write!(f, "IDENTIFYING"),
            SessionState::Active(name) => write!(f, "ACTIVE({})", name),
            SessionState::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Serves one accepted connection until it closes.
pub async fn handle_client<S>(
    stream: S,
    peer_addr: SocketAddr,
    registry: Arc<ClientRegistry>,
    config: Arc<ServerConfig>,
) where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let session = Session {
        peer_addr,
        connection: Arc::new(ClientConnection::new(write_half, peer_addr)),
        lines: LineReader::new(read_half, config.line_limit()),
        registry,
        state: SessionState::Connected,
        name: None,
    };
    session.run().await;
}

struct Session<S> {
    peer_addr: SocketAddr,
    connection: Arc<ClientConnection>,
    lines: LineReader<ReadHalf<S>>,
    registry: Arc<ClientRegistry>,
    state: SessionState,
    /// Set once the name is in the registry; drives cleanup.
    name: Option<String>,
}

impl<S: AsyncRead + AsyncWrite + Send + 'static> Session<S> {
    async fn run(mut self) {
        info!("Client connected: {}", self.peer_addr);

        loop {
            let step = match self.state.clone() {
                SessionState::Connected => self.greet().await,
                SessionState::Identifying => self.identify().await,
                SessionState::Active(name) => self.serve(&name).await,
                SessionState::Closed => break,
            };

            let next = step.unwrap_or_else(|e| {
                log_connection_fault(self.peer_addr, &e);
                SessionState::Closed
            });
            debug!("{}: {} -> {}", self.peer_addr, self.state, next);
            self.state = next;
        }

        self.teardown().await;
    }

    async fn greet(&mut self) -> io::Result<SessionState> {
        self.connection.send(&Reply::welcome()).await?;
        Ok(SessionState::Identifying)
    }

    async fn identify(&mut self) -> io::Result<SessionState> {
        let Some(line) = self.read_line().await? else {
            info!("{} left before identifying", self.peer_addr);
            return Ok(SessionState::Closed);
        };

        let name = match parse_command(&line) {
            Ok(Command::Hello(name)) => name,
            Err(ProtocolError::EmptyName) => return self.reject(ProtocolError::EmptyName).await,
            _ => return self.reject(ProtocolError::MissingHello).await,
        };

        let record = ClientRecord::new(name.clone(), Arc::clone(&self.connection));
        if let Err(e) = self.registry.register(record).await {
            info!("{} rejected: {}", self.peer_addr, e);
            return self.reject(e.into()).await;
        }
        self.name = Some(name.clone());
        let online = self.registry.len().await;
        info!("Registered {} as '{}' ({} online)", self.peer_addr, name, online);

        self.connection.send(&Reply::registered(&name)).await?;
        self.registry
            .broadcast(Some(&name), &Reply::connected(&name))
            .await;
        self.connection.send(&Reply::help()).await?;

        Ok(SessionState::Active(name))
    }

    /// Protocol errors during identification end the connection.
    async fn reject(&mut self, error: ProtocolError) -> io::Result<SessionState> {
        debug!("{} failed identification: {}", self.peer_addr, error);
        self.connection.send(&Reply::from(error)).await?;
        Ok(SessionState::Closed)
    }

    async fn serve(&mut self, name: &str) -> io::Result<SessionState> {
        loop {
            let Some(line) = self.read_line().await? else {
                info!("Connection closed by client {} ({})", name, self.peer_addr);
                return Ok(SessionState::Closed);
            };

            if line.trim().is_empty() {
                continue;
            }

            let result = process_line(name, &line, &self.registry).await;
            if let CommandStatus::Failure(reason) = &result.status {
                debug!("{}: '{}' failed: {}", name, line, reason);
            }
            if let Some(reply) = &result.message {
                self.connection.send(reply).await?;
            }
            if result.status == CommandStatus::CloseConnection {
                info!("Client {} requested to quit", name);
                return Ok(SessionState::Closed);
            }
        }
    }

    /// Reads the next line; an oversize line gets a best-effort error reply
    /// before the fault is returned.
    async fn read_line(&mut self) -> io::Result<Option<String>> {
        match self.lines.read_line().await {
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                let _ = self
                    .connection
                    .send(&Reply::from(ProtocolError::LineTooLong))
                    .await;
                Err(e)
            }
            other => other,
        }
    }

    async fn teardown(&mut self) {
        if let Some(name) = self.name.take() {
            if self.registry.remove(&name).await.is_some() {
                self.registry
                    .broadcast(Some(&name), &Reply::disconnected(&name))
                    .await;
            } else {
                warn!("'{}' was already gone from the registry", name);
            }
            info!("Client {} ({}) disconnected", name, self.peer_addr);
        } else {
            info!("Client {} disconnected", self.peer_addr);
        }

        self.connection.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncWriteExt, DuplexStream, WriteHalf};

    struct TestClient {
        lines: LineReader<ReadHalf<DuplexStream>>,
        writer: WriteHalf<DuplexStream>,
    }

    impl TestClient {
        async fn send(&mut self, line: &str) {
            self.writer
                .write_all(format!("{}\n", line).as_bytes())
                .await
                .unwrap();
        }

        async fn recv(&mut self) -> Option<String> {
            self.lines.read_line().await.unwrap()
        }
    }

    fn spawn_client(registry: &Arc<ClientRegistry>, port: u16) -> TestClient {
        let (client, server) = tokio::io::duplex(4096);
        let addr: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();
        tokio::spawn(handle_client(
            server,
            addr,
            Arc::clone(registry),
            Arc::new(ServerConfig::default()),
        ));
        let (read_half, writer) = tokio::io::split(client);
        TestClient {
            lines: LineReader::new(read_half, None),
            writer,
        }
    }

    async fn login(registry: &Arc<ClientRegistry>, port: u16, name: &str) -> TestClient {
        let mut client = spawn_client(registry, port);
        assert_eq!(client.recv().await.unwrap(), Reply::welcome().to_string());
        client.send(&format!("HELLO|{}", name)).await;
        assert_eq!(
            client.recv().await.unwrap(),
            format!("OK|Registered as {}", name)
        );
        assert_eq!(client.recv().await.unwrap(), Reply::help().to_string());
        client
    }

    #[tokio::test]
    async fn test_first_line_must_be_hello() {
        let registry = Arc::new(ClientRegistry::new());
        let mut client = spawn_client(&registry, 1);
        client.recv().await;
        client.send("LIST").await;
        assert_eq!(
            client.recv().await.unwrap(),
            "ERR|First message must be HELLO|<name>"
        );
        assert_eq!(client.recv().await, None);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_hangup_before_hello_closes_silently() {
        let registry = Arc::new(ClientRegistry::new());
        let TestClient {
            mut lines,
            mut writer,
        } = spawn_client(&registry, 1);
        assert_eq!(
            lines.read_line().await.unwrap(),
            Some(Reply::welcome().to_string())
        );

        writer.shutdown().await.unwrap();
        assert_eq!(lines.read_line().await.unwrap(), None);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let registry = Arc::new(ClientRegistry::new());
        let mut client = spawn_client(&registry, 1);
        client.recv().await;
        client.send("HELLO|   ").await;
        assert_eq!(client.recv().await.unwrap(), "ERR|Name cannot be empty");
        assert_eq!(client.recv().await, None);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let registry = Arc::new(ClientRegistry::new());
        let _alice = login(&registry, 1, "alice").await;

        let mut imposter = spawn_client(&registry, 2);
        imposter.recv().await;
        imposter.send("HELLO|alice").await;
        assert_eq!(imposter.recv().await.unwrap(), "ERR|Name already in use");
        assert_eq!(imposter.recv().await, None);

        let kept = registry.lookup("alice").await.unwrap();
        assert_eq!(kept.peer_addr().port(), 1);
    }

    #[tokio::test]
    async fn test_join_quit_notifications() {
        let registry = Arc::new(ClientRegistry::new());
        let mut alice = login(&registry, 1, "alice").await;
        let mut bob = login(&registry, 2, "bob").await;
        assert_eq!(alice.recv().await.unwrap(), "SYS|bob connected");

        bob.send("").await;
        bob.send("QUIT").await;
        assert_eq!(bob.recv().await.unwrap(), "OK|Bye");
        assert_eq!(bob.recv().await, None);

        assert_eq!(alice.recv().await.unwrap(), "SYS|bob disconnected");
        alice.send("LIST").await;
        assert_eq!(alice.recv().await.unwrap(), "USERS|alice");
    }

    #[tokio::test]
    async fn test_abrupt_disconnect_cleans_up() {
        let registry = Arc::new(ClientRegistry::new());
        let mut alice = login(&registry, 1, "alice").await;
        let bob = login(&registry, 2, "bob").await;
        assert_eq!(alice.recv().await.unwrap(), "SYS|bob connected");

        drop(bob);
        assert_eq!(alice.recv().await.unwrap(), "SYS|bob disconnected");
        assert!(registry.lookup("bob").await.is_none());
    }

    #[tokio::test]
    async fn test_oversize_line_closes_connection() {
        let registry = Arc::new(ClientRegistry::new());
        let (client, server) = tokio::io::duplex(1 << 16);
        let addr: SocketAddr = "127.0.0.1:9".parse().unwrap();
        let config = ServerConfig {
            max_line_length: 16,
            ..ServerConfig::default()
        };
        tokio::spawn(handle_client(
            server,
            addr,
            Arc::clone(&registry),
            Arc::new(config),
        ));

        let (read_half, mut writer) = tokio::io::split(client);
        let mut lines = LineReader::new(read_half, None);
        lines.read_line().await.unwrap();
        writer.write_all(&[b'x'; 64]).await.unwrap();
        assert_eq!(
            lines.read_line().await.unwrap(),
            Some("ERR|Line too long".into())
        );
        assert_eq!(lines.read_line().await.unwrap(), None);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Active("bob".into()).to_string(), "ACTIVE(bob)");
        assert_eq!(SessionState::Closed.to_string(), "CLOSED");
    }
}
