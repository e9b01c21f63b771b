//! SSE HTTP handler for the web layer.
//!
//! This module contains only the Axum handler for the settings stream.
//! The core SSE infrastructure (Manager, ConnectionRegistry, StreamSession)
//! lives in the `sse` crate so the domain event handler can reach it too.

pub mod handler;
