use super::{Diagnostics, SettingsBackend};
use crate::error::Error;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Keeps the document in process memory. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryBackend {
    document: RwLock<Option<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts out holding `json` as if it had been written earlier.
    pub fn with_document(json: impl Into<String>) -> Self {
        Self {
            document: RwLock::new(Some(json.into())),
        }
    }
}

#[async_trait]
impl SettingsBackend for MemoryBackend {
    async fn read_raw(&self) -> Result<Option<String>, Error> {
        Ok(self.document.read().await.clone())
    }

    async fn write_raw(&self, json: String) -> Result<(), Error> {
        *self.document.write().await = Some(json);
        Ok(())
    }

    async fn diagnostics(&self) -> Diagnostics {
        Diagnostics::new("memory", None, None).with_probe(Ok::<(), Error>(()))
    }
}
