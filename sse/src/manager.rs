use crate::connection::{ConnectionId, ConnectionRegistry, Subscriber};
use crate::message::Message;
use log::*;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Per-subscriber queue capacity used by `Manager::default()`.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// The process-wide settings broadcaster.
///
/// One instance lives in the application state and is shared by handle;
/// every operation is safe to call concurrently from any task.
pub struct Manager {
    registry: Arc<ConnectionRegistry>,
    queue_capacity: usize,
    closed: AtomicBool,
}

impl Manager {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
            queue_capacity: queue_capacity.max(1),
            closed: AtomicBool::new(false),
        }
    }

    /// Creates a delivery queue, registers it and hands back the receiving side.
    ///
    /// After `close_all` the queue comes back already closed, so a session
    /// started during shutdown ends right after its `init` message.
    pub fn subscribe(&self) -> Subscriber {
        let (sender, receiver) = mpsc::channel(self.queue_capacity);
        let connection_id = self.registry.register(sender);

        // Checked after registering: either this sees the flag or close_all's
        // sweep sees the new entry.
        if self.is_closed() {
            self.registry.unregister(&connection_id);
            debug!(
                "Refused SSE connection {} after shutdown",
                connection_id.as_str()
            );
            return Subscriber::new(connection_id, receiver);
        }

        info!(
            "Registered SSE connection {} ({} active)",
            connection_id.as_str(),
            self.registry.len()
        );
        Subscriber::new(connection_id, receiver)
    }

    /// Removes a subscriber. Safe to call for one that is already gone.
    pub fn unsubscribe(&self, connection_id: &ConnectionId) {
        if self.registry.unregister(connection_id) {
            info!(
                "Unregistered SSE connection {} ({} active)",
                connection_id.as_str(),
                self.registry.len()
            );
        }
    }

    /// Queues a `settings` message carrying `snapshot` for every subscriber.
    /// Never waits on a consumer; stalled or dead subscribers are dropped.
    pub fn publish(&self, snapshot: Value) {
        let message = Arc::new(Message::Settings { settings: snapshot });
        let delivered = self.registry.broadcast(message);
        debug!("Published settings snapshot to {delivered} SSE connection(s)");
    }

    /// Drops every subscriber, ending each session's stream once it has
    /// drained what was already queued, and closes the manager to new ones.
    /// Used on shutdown, since open streams would otherwise keep the server
    /// waiting forever.
    pub fn close_all(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let closed = self.registry.clear();
        info!("Closed {closed} SSE connection(s)");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    pub fn is_subscribed(&self, connection_id: &ConnectionId) -> bool {
        self.registry.contains(connection_id)
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn subscriber_sees_publishes_in_order() {
        let manager = Manager::default();
        let mut subscriber = manager.subscribe();

        for n in 0..5 {
            manager.publish(json!({ "persist_until": n }));
        }

        for n in 0..5 {
            let message = subscriber.recv().await.unwrap();
            assert_eq!(
                *message,
                Message::Settings {
                    settings: json!({ "persist_until": n })
                }
            );
        }
    }

    #[tokio::test]
    async fn publish_only_reaches_current_subscribers() {
        let manager = Manager::default();
        let mut early = manager.subscribe();

        manager.publish(json!({"timer_disabled": true}));
        let mut late = manager.subscribe();
        manager.publish(json!({"timer_disabled": false}));

        assert_eq!(
            *early.recv().await.unwrap(),
            Message::Settings {
                settings: json!({"timer_disabled": true})
            }
        );
        assert_eq!(
            *late.recv().await.unwrap(),
            Message::Settings {
                settings: json!({"timer_disabled": false})
            }
        );
    }

    #[tokio::test]
    async fn stalled_subscriber_is_dropped_instead_of_blocking() {
        let manager = Manager::new(1);
        let stalled = manager.subscribe();

        // Nobody reads from `stalled`; these calls must all return promptly
        for n in 0..10 {
            manager.publish(json!({ "persist_until": n }));
        }

        assert!(!manager.is_subscribed(stalled.id()));
        assert_eq!(manager.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn unsubscribe_twice_is_harmless() {
        let manager = Manager::default();
        let subscriber = manager.subscribe();

        manager.unsubscribe(subscriber.id());
        manager.unsubscribe(subscriber.id());

        assert_eq!(manager.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn close_all_ends_every_subscriber() {
        let manager = Manager::default();
        let mut first = manager.subscribe();
        let mut second = manager.subscribe();
        manager.publish(json!({}));

        manager.close_all();

        assert_eq!(manager.subscriber_count(), 0);
        assert!(first.recv().await.is_some());
        assert!(first.recv().await.is_none());
        assert!(second.recv().await.is_some());
        assert!(second.recv().await.is_none());
    }

    #[tokio::test]
    async fn subscribe_after_close_all_gets_a_closed_queue() {
        let manager = Manager::default();
        manager.close_all();

        let mut late = manager.subscribe();
        manager.publish(json!({"timer_disabled": true}));

        assert!(manager.is_closed());
        assert!(!manager.is_subscribed(late.id()));
        assert_eq!(manager.subscriber_count(), 0);
        assert!(late.recv().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn registry_survives_concurrent_churn() {
        let manager = Arc::new(Manager::default());

        let churners: Vec<_> = (0..32)
            .map(|_| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move {
                    for _ in 0..50 {
                        let subscriber = manager.subscribe();
                        tokio::task::yield_now().await;
                        manager.unsubscribe(subscriber.id());
                    }
                })
            })
            .collect();
        let publisher = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move {
                for n in 0..500 {
                    manager.publish(json!({ "persist_until": n }));
                    tokio::task::yield_now().await;
                }
            })
        };

        for churner in churners {
            churner.await.unwrap();
        }
        publisher.await.unwrap();

        assert_eq!(manager.subscriber_count(), 0);
    }
}
