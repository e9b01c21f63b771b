//! This module re-exports various items from the `entity_api` crate.
//!
//! The purpose of this re-export is to ensure that consumers of the `domain` crate do not need to
//! directly depend on the `entity_api` crate. By re-exporting these items, we provide a clear and
//! consistent interface for working with the settings document within the domain layer, while the
//! storage details remain encapsulated in the `entity_api` crate.
pub use entity_api::{
    DatabaseBackend, Diagnostics, EventConfig, FileBackend, MemoryBackend, Settings,
    SettingsBackend, SettingsStore,
};

pub mod error;
pub mod settings;
