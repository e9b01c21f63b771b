use crate::message::Message;
use dashmap::DashMap;
use log::*;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Sending half of a subscriber's delivery queue.
pub type MessageSender = mpsc::Sender<Arc<Message>>;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// A registered subscriber: its id plus the receiving half of its bounded
/// FIFO delivery queue. Owned by exactly one stream session.
#[derive(Debug)]
pub struct Subscriber {
    id: ConnectionId,
    receiver: mpsc::Receiver<Arc<Message>>,
}

impl Subscriber {
    pub(crate) fn new(id: ConnectionId, receiver: mpsc::Receiver<Arc<Message>>) -> Self {
        Self { id, receiver }
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Waits for the next queued message. Returns `None` once the registry
    /// has dropped this subscriber and the queue is drained.
    pub async fn recv(&mut self) -> Option<Arc<Message>> {
        self.receiver.recv().await
    }
}

/// Concurrent registry of live subscriber queues.
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, MessageSender>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register a new connection - O(1)
    pub fn register(&self, sender: MessageSender) -> ConnectionId {
        let connection_id = ConnectionId::new();
        self.connections.insert(connection_id.clone(), sender);
        connection_id
    }

    /// Unregister a connection - O(1). Returns whether it was still registered.
    pub fn unregister(&self, connection_id: &ConnectionId) -> bool {
        self.connections.remove(connection_id).is_some()
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.connections.contains_key(connection_id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Drops every registered queue. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let removed = self.connections.len();
        self.connections.clear();
        removed
    }

    /// Enqueue `message` on every registered queue without waiting - O(n).
    ///
    /// Queues that are full (stalled consumer) or closed (consumer gone) are
    /// evicted once the sweep is done. Dropping an evicted sender ends that
    /// subscriber's stream after it drains what was already queued.
    /// Returns the number of queues the message was delivered to.
    pub fn broadcast(&self, message: Arc<Message>) -> usize {
        let mut delivered = 0;
        let mut evicted = Vec::new();

        for entry in self.connections.iter() {
            match entry.value().try_send(Arc::clone(&message)) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        "SSE connection {} is not keeping up; dropping it",
                        entry.key().as_str()
                    );
                    evicted.push(entry.key().clone());
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(
                        "SSE connection {} is gone; dropping it",
                        entry.key().as_str()
                    );
                    evicted.push(entry.key().clone());
                }
            }
        }

        // Removal happens outside the iteration, which holds shard read locks
        for connection_id in evicted {
            self.connections.remove(&connection_id);
        }

        delivered
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
