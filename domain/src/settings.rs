//! Settings operations exposed to the web layer.
//!
//! Every mutation runs under the store's writer lock and publishes
//! `DomainEvent::SettingsChanged` only after the save has completed, so a
//! subscriber that sees a notification can always read at least that state
//! back from the store.
use crate::error::Error;
use entity_api::error::Error as EntityApiError;
use entity_api::{
    Diagnostics, EventConfig, EventConfigPatch, Settings, SettingsPatch, SettingsStore,
};
use events::{DomainEvent, EventPublisher};
use log::*;
use serde_json::Value;

pub async fn find(store: &SettingsStore) -> Result<Settings, Error> {
    Ok(store.load().await?)
}

pub async fn find_event(store: &SettingsStore, event_type: &str) -> Result<EventConfig, Error> {
    Ok(store.find_event(event_type).await?)
}

/// Merges a `PUT /settings` body into the document and returns the result.
pub async fn update(
    store: &SettingsStore,
    publisher: &EventPublisher,
    body: Value,
) -> Result<Settings, Error> {
    let patch = SettingsPatch::from_json(body).map_err(EntityApiError::validation)?;

    let writer = store.writer().await;
    let settings = writer.merge_top_level(patch).await?;
    notify(publisher, &settings).await;

    Ok(settings)
}

/// Merges a per-event-type body and returns that event type's new config.
pub async fn update_event(
    store: &SettingsStore,
    publisher: &EventPublisher,
    event_type: &str,
    body: Value,
) -> Result<EventConfig, Error> {
    let patch = EventConfigPatch::from_json(body).map_err(EntityApiError::validation)?;

    let writer = store.writer().await;
    let settings = writer.merge_event(event_type, patch).await?;
    notify(publisher, &settings).await;

    Ok(settings.event(event_type))
}

/// Resets the document to `{}`.
pub async fn clear(store: &SettingsStore, publisher: &EventPublisher) -> Result<(), Error> {
    let writer = store.writer().await;
    let settings = writer.clear().await?;
    notify(publisher, &settings).await;

    Ok(())
}

/// Overwrites the whole document without notifying anyone. Meant for
/// offline tools such as `migrate_settings`.
pub async fn replace(store: &SettingsStore, settings: &Settings) -> Result<(), Error> {
    let writer = store.writer().await;
    Ok(writer.save(settings).await?)
}

pub async fn diagnostics(store: &SettingsStore) -> Diagnostics {
    store.diagnostics().await
}

async fn notify(publisher: &EventPublisher, settings: &Settings) {
    match serde_json::to_value(settings) {
        Ok(settings) => {
            publisher
                .publish(DomainEvent::SettingsChanged { settings })
                .await
        }
        // The save already succeeded; subscribers pick the change up on reconnect
        Err(e) => error!("Failed to encode settings snapshot for publishing: {e}"),
    }
}
