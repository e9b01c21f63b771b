//! Server-Sent Events (SSE) infrastructure for live settings updates.
//!
//! This crate fans every settings change out to all connected clients.
//!
//! # Architecture
//!
//! - **One registry per process**: [`Manager`] owns a [`connection::ConnectionRegistry`]
//!   (a DashMap of bounded delivery queues) and is shared by handle through the
//!   application state.
//! - **Non-blocking publish**: broadcasting uses `try_send`; a subscriber whose queue
//!   is full or closed is evicted instead of stalling the publisher.
//! - **Scoped subscriptions**: a [`session::StreamSession`] owns a drop guard, so the
//!   registry entry is removed on every exit path, including client disconnects.
//! - **Ephemeral messages**: events are not replayed. A client that reconnects gets a
//!   fresh `init` snapshot instead.
//!
//! # Message Flow
//!
//! 1. Client opens `GET /settings/stream`
//! 2. Handler calls `StreamSession::connect`, which subscribes
//! 3. Handler loads the current document and streams it as `init`
//! 4. A mutation saves, then publishes `DomainEvent::SettingsChanged`
//! 5. `SseDomainEventHandler` calls `Manager::publish`, which queues a
//!    `settings` message for every subscriber
//! 6. Each session relays its queue to its connection as `data:` frames
//!
//! # Modules
//!
//! - `connection`: ConnectionRegistry, ConnectionId and Subscriber
//! - `manager`: the broadcaster (subscribe / unsubscribe / publish)
//! - `message`: typed stream messages
//! - `session`: per-connection lifecycle
//! - `domain_event_handler`: bridge from domain events to the broadcaster

pub mod connection;
pub mod domain_event_handler;
pub mod manager;
pub mod message;
pub mod session;

pub use manager::Manager;
