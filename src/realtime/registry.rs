//! Live connection registry.
//!
//! Each socket gets an unbounded outbound queue drained by its writer task.
//! Sends never block the caller; a closed queue removes the connection.

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::protocol::ServerMessage;

pub type ConnectionId = Uuid;

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, mpsc::UnboundedSender<String>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and return the receiving end of its queue.
    pub fn register(&self) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.connections.insert(id, tx);
        tracing::debug!(connection_id = %id, total = self.connections.len(), "Connection registered");
        (id, rx)
    }

    pub fn remove(&self, id: &ConnectionId) {
        if self.connections.remove(id).is_some() {
            tracing::debug!(connection_id = %id, "Connection removed");
        }
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Queue a message for one connection. Returns false if it is gone.
    pub fn send_to(&self, id: &ConnectionId, message: &ServerMessage) -> bool {
        let Some(text) = encode(message) else {
            return false;
        };

        let delivered = self
            .connections
            .get(id)
            .map(|tx| tx.send(text).is_ok())
            .unwrap_or(false);

        if !delivered {
            self.remove(id);
        }
        delivered
    }

    /// Queue a message for every connection; returns how many accepted it.
    pub fn broadcast(&self, message: &ServerMessage) -> usize {
        let Some(text) = encode(message) else {
            return 0;
        };

        let mut dead = Vec::new();
        let mut delivered = 0;
        for entry in self.connections.iter() {
            if entry.value().send(text.clone()).is_ok() {
                delivered += 1;
            } else {
                dead.push(*entry.key());
            }
        }

        // Removal must wait until the iterator's shard locks are released.
        for id in dead {
            self.remove(&id);
        }
        delivered
    }
}

fn encode(message: &ServerMessage) -> Option<String> {
    serde_json::to_string(message)
        .map_err(|e| tracing::error!(error = %e, "Failed to encode realtime message"))
        .ok()
}
