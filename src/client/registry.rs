//! Client registry
//!
//! Single source of truth for who is online. Every operation takes the one
//! internal lock; the backing map is never handed out.

use log::{debug, warn};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::client::ClientConnection;
use crate::error::RegistryError;
use crate::protocol::Reply;

/// An identified client as seen by everyone else.
#[derive(Clone)]
pub struct ClientRecord {
    name: String,
    connection: Arc<ClientConnection>,
    peer_addr: SocketAddr,
}

impl ClientRecord {
    pub fn new(name: String, connection: Arc<ClientConnection>) -> Self {
        let peer_addr = connection.peer_addr();
        Self {
            name,
            connection,
            peer_addr,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connection(&self) -> &Arc<ClientConnection> {
        &self.connection
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }
}

/// Registry for tracking identified clients by display name
#[derive(Default)]
pub struct ClientRegistry {
    clients: Mutex<BTreeMap<String, ClientRecord>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the record unless its name is already taken.
    pub async fn register(&self, record: ClientRecord) -> Result<(), RegistryError> {
        let mut clients = self.clients.lock().await;
        if clients.contains_key(record.name()) {
            return Err(RegistryError::NameTaken(record.name));
        }
        clients.insert(record.name.clone(), record);
        Ok(())
    }

    /// Removes and returns the record for `name`; a second call returns `None`.
    pub async fn remove(&self, name: &str) -> Option<ClientRecord> {
        self.clients.lock().await.remove(name)
    }

    pub async fn lookup(&self, name: &str) -> Option<ClientRecord> {
        self.clients.lock().await.get(name).cloned()
    }

    /// Sorted copy of the names currently online.
    pub async fn snapshot_names(&self) -> Vec<String> {
        self.clients.lock().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.clients.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.lock().await.is_empty()
    }

    /// Best-effort delivery of `reply` to everyone except `exclude`.
    ///
    /// Recipients are snapshotted and the lock released before any I/O.
    /// A failed send is logged and skipped. Returns the number of clients
    /// that accepted the line.
    pub async fn broadcast(&self, exclude: Option<&str>, reply: &Reply) -> usize {
        let recipients: Vec<(String, Arc<ClientConnection>)> = {
            let clients = self.clients.lock().await;
            clients
                .iter()
                .filter(|(name, _)| Some(name.as_str()) != exclude)
                .map(|(name, record)| (name.clone(), Arc::clone(&record.connection)))
                .collect()
        };

        let mut delivered = 0;
        for (name, connection) in recipients {
            match connection.send(reply).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!("Broadcast to {} ({}) failed: {}", name, connection.peer_addr(), e),
            }
        }
        debug!("Broadcast '{}' reached {} client(s)", reply, delivered);
        delivered
    }
}
