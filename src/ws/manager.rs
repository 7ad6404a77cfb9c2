//! WebSocket connection manager — hands out connection ids and keeps one
//! outbound channel per connection for `broadcast()` and `send_to()`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};

use super::messages::ServerEvent;
use crate::game::types::ConnectionId;

/// Handle for a single WebSocket client.  The handler owns the
/// receiving half; the manager keeps the sending half.
pub type ClientSender = mpsc::UnboundedSender<ServerEvent>;

/// Tracks every live connection and fans events out to them.
#[derive(Debug)]
pub struct WsManager {
    clients: RwLock<HashMap<ConnectionId, ClientSender>>,
    /// Monotonically increasing counter for connection ids.
    next_id: AtomicU64,
}

impl WsManager {
    /// Create a new, empty manager.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a new connection, returning (connection_id, receiver).
    pub async fn register(&self) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();

        self.clients.write().await.insert(id, tx);

        debug!(conn = id, "WS client registered");
        (id, rx)
    }

    /// Remove a connection. Idempotent.
    pub async fn unregister(&self, conn: ConnectionId) {
        if self.clients.write().await.remove(&conn).is_some() {
            debug!(conn, "WS client unregistered");
        }
    }

    /// Send an event to every connection.
    pub async fn broadcast(&self, event: ServerEvent) {
        let clients = self.clients.read().await;
        let mut stale: Vec<ConnectionId> = Vec::new();
        for (&cid, tx) in clients.iter() {
            if tx.send(event.clone()).is_err() {
                stale.push(cid);
            }
        }
        drop(clients); // release read lock before write

        if !stale.is_empty() {
            let mut clients = self.clients.write().await;
            for cid in &stale {
                clients.remove(cid);
                warn!(conn = cid, "removed stale WS client");
            }
        }
    }

    /// Send an event to a single connection. Unknown or closed
    /// connections are ignored.
    pub async fn send_to(&self, conn: ConnectionId, event: ServerEvent) {
        let clients = self.clients.read().await;
        if let Some(tx) = clients.get(&conn)
            && tx.send(event).is_err()
        {
            debug!(conn, "dropped event for closed WS client");
        }
    }

    /// Number of live connections.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
