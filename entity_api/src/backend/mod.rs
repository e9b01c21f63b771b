//! Storage backends for the settings document.
//!
//! A backend only moves the serialized document in and out of storage; all
//! document semantics (decoding, merging, whitelists) live in
//! [`crate::settings::SettingsStore`].

use crate::error::Error;
use async_trait::async_trait;
use serde::Serialize;

mod database;
mod file;
mod memory;

pub use database::DatabaseBackend;
pub use file::FileBackend;
pub use memory::MemoryBackend;

#[async_trait]
pub trait SettingsBackend: Send + Sync {
    /// Returns the stored document text, or `None` when nothing has been stored yet.
    async fn read_raw(&self) -> Result<Option<String>, Error>;

    /// Replaces the stored document. Implementations must never leave a
    /// partially written document behind.
    async fn write_raw(&self, json: String) -> Result<(), Error>;

    /// Connectivity report for the `/db-health` endpoint.
    async fn diagnostics(&self) -> Diagnostics;
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagnostics {
    pub ok: bool,
    pub driver: String,
    pub database: Option<String>,
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Diagnostics {
    pub(crate) fn new(driver: &str, database: Option<String>, host: Option<String>) -> Self {
        Self {
            ok: false,
            driver: driver.to_string(),
            database,
            host,
            error: None,
        }
    }

    pub(crate) fn with_probe<E: std::fmt::Display>(mut self, probe: Result<(), E>) -> Self {
        match probe {
            Ok(()) => self.ok = true,
            Err(e) => self.error = Some(e.to_string()),
        }
        self
    }
}
