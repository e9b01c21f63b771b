//! Partial updates to the settings document.
//!
//! Every patch field is tri-state: absent leaves the stored value alone,
//! `null` clears it and any other value overwrites it. Only whitelisted keys
//! are recognized; everything else in a patch body is ignored.
use crate::document::{EventConfig, Settings};
use serde::de::{Deserializer, Error as DeError};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SettingsPatch {
    #[serde(default, deserialize_with = "present")]
    pub persist_until: Option<Option<Value>>,
    #[serde(default, deserialize_with = "present")]
    pub timer_disabled: Option<Option<bool>>,
    #[serde(default, deserialize_with = "event_patches")]
    pub events: BTreeMap<String, EventConfigPatch>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct EventConfigPatch {
    #[serde(default, deserialize_with = "present")]
    pub disabled: Option<Option<bool>>,
    #[serde(default, deserialize_with = "present")]
    pub override_start_ms: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub display_mode: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub custom_label: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub event_over: Option<Option<bool>>,
}

impl SettingsPatch {
    /// Decodes a request body. Anything but a JSON object is rejected.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        require_object(&value)?;
        serde_json::from_value(value)
    }

    /// Copies the present top-level keys into `doc` and merges each event
    /// entry into the stored config for that event type.
    pub fn apply_to(self, doc: &mut Settings) {
        if let Some(persist_until) = self.persist_until {
            doc.persist_until = persist_until;
        }
        if let Some(timer_disabled) = self.timer_disabled {
            doc.timer_disabled = timer_disabled;
        }
        for (event_type, patch) in self.events {
            patch.apply_to(doc.events.entry(event_type).or_default());
        }
    }
}

impl EventConfigPatch {
    /// Decodes a request body. Anything but a JSON object is rejected.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        require_object(&value)?;
        serde_json::from_value(value)
    }

    pub fn apply_to(self, config: &mut EventConfig) {
        if let Some(disabled) = self.disabled {
            config.disabled = disabled;
        }
        if let Some(override_start_ms) = self.override_start_ms {
            config.override_start_ms = override_start_ms;
        }
        if let Some(display_mode) = self.display_mode {
            config.display_mode = display_mode;
        }
        if let Some(custom_label) = self.custom_label {
            config.custom_label = custom_label;
        }
        if let Some(event_over) = self.event_over {
            config.event_over = event_over;
        }
    }
}

fn require_object(value: &Value) -> Result<(), serde_json::Error> {
    if value.is_object() {
        Ok(())
    } else {
        Err(serde_json::Error::custom("expected a JSON object"))
    }
}

// Wraps the decoded value in `Some` so `#[serde(default)]` can tell an
// absent key (None) from an explicit null (Some(None)).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// Non-object `events` values and non-object entries are skipped rather than
// rejected; malformed fields inside an entry are still an error.
fn event_patches<'de, D>(deserializer: D) -> Result<BTreeMap<String, EventConfigPatch>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Object(entries) = Value::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };

    let mut patches = BTreeMap::new();
    for (event_type, entry) in entries {
        if !entry.is_object() {
            continue;
        }
        let patch = EventConfigPatch::deserialize(entry).map_err(D::Error::custom)?;
        patches.insert(event_type, patch);
    }
    Ok(patches)
}
