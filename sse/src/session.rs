//! Lifecycle of one streaming connection.
//!
//! A session moves `Connecting -> Streaming -> Closed`. It subscribes as
//! soon as it is created, emits an `init` snapshot straight to the
//! connection, then relays whatever the broadcaster queues for it. The
//! subscription is released by a drop guard, so it is released whichever
//! way the session ends: the queue closes, the client disconnects and the
//! response stream is dropped, or the task is cancelled.
use crate::connection::{ConnectionId, Subscriber};
use crate::message::{EventType, Message, SERIALIZATION_ERROR_JSON};
use crate::Manager;
use async_stream::stream;
use axum::response::sse::Event;
use futures::{Stream, StreamExt};
use log::*;
use serde_json::Value;
use std::convert::Infallible;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Streaming,
    Closed,
}

pub struct StreamSession {
    subscriber: Subscriber,
    guard: SubscriptionGuard,
}

/// Unsubscribes from the broadcaster when dropped.
struct SubscriptionGuard {
    manager: Arc<Manager>,
    connection_id: ConnectionId,
    state: SessionState,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        debug!(
            "SSE connection {} leaving {:?} state, cleaning up",
            self.connection_id.as_str(),
            self.state
        );
        self.manager.unsubscribe(&self.connection_id);
    }
}

impl StreamSession {
    /// Subscribes to `manager`. Load the init snapshot only after this
    /// returns, so no change between snapshot and subscription is missed.
    pub fn connect(manager: Arc<Manager>) -> Self {
        let subscriber = manager.subscribe();
        let guard = SubscriptionGuard {
            manager,
            connection_id: subscriber.id().clone(),
            state: SessionState::Connecting,
        };
        Self { subscriber, guard }
    }

    pub fn id(&self) -> &ConnectionId {
        self.subscriber.id()
    }

    pub fn state(&self) -> SessionState {
        self.guard.state
    }

    /// The session's messages: `init` carrying `init_snapshot`, then every
    /// queued broadcast until the queue closes.
    pub fn into_messages(
        self,
        init_snapshot: Value,
    ) -> impl Stream<Item = Arc<Message>> + Send + 'static {
        let StreamSession {
            mut subscriber,
            mut guard,
        } = self;

        stream! {
            guard.state = SessionState::Streaming;
            yield Arc::new(Message::Init { settings: init_snapshot });

            // The only suspension point: waiting for the next queued message
            while let Some(message) = subscriber.recv().await {
                trace!(
                    "Relaying {} message to SSE connection {}",
                    message.event_type(),
                    guard.connection_id.as_str()
                );
                yield message;
            }

            guard.state = SessionState::Closed;
            debug!(
                "SSE connection {} was dropped by the broadcaster",
                guard.connection_id.as_str()
            );
        }
    }

    /// The session as SSE frames, ready to hand to `axum::response::sse::Sse`.
    pub fn into_event_stream(
        self,
        init_snapshot: Value,
    ) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
        self.into_messages(init_snapshot)
            .map(|message| Ok::<_, Infallible>(encode(&message)))
    }
}

/// Renders a message as one `data:` frame. A message that cannot be
/// serialized is replaced by the in-band error message.
pub fn encode(message: &Message) -> Event {
    match serde_json::to_string(message) {
        Ok(json) => Event::default().data(json),
        Err(e) => {
            error!("Failed to serialize {} message: {e}", message.event_type());
            Event::default().data(SERIALIZATION_ERROR_JSON)
        }
    }
}
