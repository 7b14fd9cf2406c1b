//! Module `connection`
//!
//! The send side of one client socket. The handler that accepted the socket
//! owns it; the registry keeps a shared reference only to deliver lines.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::protocol::Reply;

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Writer half of a client connection behind a per-connection send lock.
pub struct ClientConnection {
    writer: Mutex<BoxedWriter>,
    peer_addr: SocketAddr,
    closed: AtomicBool,
}

impl ClientConnection {
    pub fn new<W>(writer: W, peer_addr: SocketAddr) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            writer: Mutex::new(Box::new(writer)),
            peer_addr,
            closed: AtomicBool::new(false),
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Writes one reply followed by `\n`.
    ///
    /// The whole line is written and flushed under the send lock, so
    /// concurrent senders never interleave partial lines.
    pub async fn send(&self, reply: &Reply) -> io::Result<()> {
        let mut line = reply.to_string();
        line.push('\n');

        let mut writer = self.writer.lock().await;
        if self.is_closed() {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection already closed",
            ));
        }
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await
    }

    /// Shuts the writer down. Only the first call has any effect.
    pub async fn close(&self) {
        let mut writer = self.writer.lock().await;
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Err(e) = writer.shutdown().await {
            debug!("Shutdown of {} failed: {}", self.peer_addr, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::LineReader;
    use std::sync::Arc;

    fn addr() -> SocketAddr {
        "127.0.0.1:4000".parse().unwrap()
    }

    #[tokio::test]
    async fn test_send_writes_terminated_line() {
        let (writer, reader) = tokio::io::duplex(256);
        let conn = ClientConnection::new(writer, addr());
        let mut lines = LineReader::new(reader, None);

        conn.send(&Reply::bye()).await.unwrap();
        assert_eq!(lines.read_line().await.unwrap(), Some("OK|Bye".into()));
    }

    #[tokio::test]
    async fn test_concurrent_sends_do_not_interleave() {
        let (writer, reader) = tokio::io::duplex(64);
        let conn = Arc::new(ClientConnection::new(writer, addr()));
        let body = "x".repeat(500);

        let mut tasks = Vec::new();
        for i in 0..8 {
            let conn = Arc::clone(&conn);
            let body = body.clone();
            tasks.push(tokio::spawn(async move {
                conn.send(&Reply::From {
                    sender: format!("u{}", i),
                    body,
                })
                .await
                .unwrap();
            }));
        }

        let mut lines = LineReader::new(reader, None);
        for _ in 0..8 {
            let line = lines.read_line().await.unwrap().unwrap();
            let (_, rest) = line.split_once("|").unwrap();
            let (_, got) = rest.split_once("|").unwrap();
            assert_eq!(got, body);
        }
        for task in tasks {
            task.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_blocks_sends() {
        let (writer, reader) = tokio::io::duplex(64);
        let conn = ClientConnection::new(writer, addr());

        conn.close().await;
        conn.close().await;
        assert!(conn.is_closed());

        let err = conn.send(&Reply::bye()).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);

        let mut lines = LineReader::new(reader, None);
        assert_eq!(lines.read_line().await.unwrap(), None);
    }
}
