//! The settings store: document semantics on top of a [`SettingsBackend`].
use crate::backend::{Diagnostics, SettingsBackend};
use crate::error::Error;
use entity::{EventConfig, EventConfigPatch, Settings, SettingsPatch};
use log::*;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

pub struct SettingsStore {
    backend: Arc<dyn SettingsBackend>,
    writer: Mutex<()>,
}

/// Exclusive access to mutate the document.
///
/// Holding a writer serializes load-modify-save cycles within this process,
/// so merges never lose each other's keys and anything the holder does
/// before dropping it (such as publishing the new snapshot) happens in save
/// order. Other processes sharing the same backing store are not covered:
/// between processes the last save wins.
pub struct SettingsWriter<'a> {
    store: &'a SettingsStore,
    _guard: MutexGuard<'a, ()>,
}

impl SettingsStore {
    pub fn new(backend: Arc<dyn SettingsBackend>) -> Self {
        Self {
            backend,
            writer: Mutex::new(()),
        }
    }

    /// Current document. Missing, blank and malformed content all read as the
    /// empty document; only a failing backend is an error.
    pub async fn load(&self) -> Result<Settings, Error> {
        let raw = self.backend.read_raw().await?;
        Ok(decode(raw))
    }

    /// The stored config for `event_type`, or an empty config.
    pub async fn find_event(&self, event_type: &str) -> Result<EventConfig, Error> {
        Ok(self.load().await?.event(event_type))
    }

    pub async fn diagnostics(&self) -> Diagnostics {
        self.backend.diagnostics().await
    }

    pub async fn writer(&self) -> SettingsWriter<'_> {
        SettingsWriter {
            store: self,
            _guard: self.writer.lock().await,
        }
    }
}

impl SettingsWriter<'_> {
    pub async fn load(&self) -> Result<Settings, Error> {
        self.store.load().await
    }

    /// Overwrites the whole document.
    pub async fn save(&self, doc: &Settings) -> Result<(), Error> {
        let json = serde_json::to_string(doc)?;
        self.store.backend.write_raw(json).await
    }

    /// Resets the document to `{}` and returns it.
    pub async fn clear(&self) -> Result<Settings, Error> {
        let empty = Settings::default();
        self.save(&empty).await?;
        info!("Settings cleared");
        Ok(empty)
    }

    /// Applies the whitelisted top-level keys and event entries of `patch`
    /// and saves the result.
    pub async fn merge_top_level(&self, patch: SettingsPatch) -> Result<Settings, Error> {
        let mut doc = self.load().await?;
        patch.apply_to(&mut doc);
        self.save(&doc).await?;

        debug!("Merged settings patch, document now: {doc:?}");
        Ok(doc)
    }

    /// Applies `patch` to the config of one event type and saves the result.
    /// Returns the whole document so callers can broadcast it.
    pub async fn merge_event(
        &self,
        event_type: &str,
        patch: EventConfigPatch,
    ) -> Result<Settings, Error> {
        let mut doc = self.load().await?;
        patch.apply_to(doc.events.entry(event_type.to_string()).or_default());
        self.save(&doc).await?;

        debug!("Merged event patch for {event_type}, document now: {doc:?}");
        Ok(doc)
    }
}

// Only content that is not a JSON object reads as empty. Inside an object,
// mistyped fields are dropped one by one so the rest survives the next save.
fn decode(raw: Option<String>) -> Settings {
    let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
        return Settings::default();
    };

    let stored = match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(stored)) => stored,
        Ok(_) => {
            warn!("Stored settings are not a JSON object, treating them as empty");
            return Settings::default();
        }
        Err(e) => {
            warn!("Stored settings are malformed, treating them as empty: {e}");
            return Settings::default();
        }
    };

    let (settings, dropped) = Settings::from_stored(stored);
    if !dropped.is_empty() {
        warn!("Ignoring mistyped stored settings fields: {}", dropped.join(", "));
    }
    settings
}
