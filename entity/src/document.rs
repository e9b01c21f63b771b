use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// The settings document. Exactly one exists and it is always read and
/// written as a whole.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Settings {
    /// Opaque marker owned by the clients, stored verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub persist_until: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_disabled: Option<bool>,
    /// Per event-type overrides keyed by event-type name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub events: BTreeMap<String, EventConfig>,
}

/// Override block for a single event type.
///
/// Unknown keys are dropped when deserializing so they never reach storage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EventConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_start_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_over: Option<bool>,
}

impl Settings {
    pub fn is_empty(&self) -> bool {
        self == &Settings::default()
    }

    /// Returns the config stored for `event_type`, or an empty one.
    pub fn event(&self, event_type: &str) -> EventConfig {
        self.events.get(event_type).cloned().unwrap_or_default()
    }

    /// Reads a stored document field by field. A known field holding the
    /// wrong type, or an event entry that is not an object, is left out and
    /// its path is returned; every other field is kept.
    pub fn from_stored(mut stored: Map<String, Value>) -> (Settings, Vec<String>) {
        let mut dropped = Vec::new();

        let persist_until = stored.remove("persist_until").filter(|v| !v.is_null());
        let timer_disabled = take(&mut stored, "timer_disabled", "", &mut dropped);

        let mut events = BTreeMap::new();
        match stored.remove("events") {
            None | Some(Value::Null) => {}
            Some(Value::Object(entries)) => {
                for (event_type, entry) in entries {
                    let Value::Object(entry) = entry else {
                        dropped.push(format!("events.{event_type}"));
                        continue;
                    };
                    let prefix = format!("events.{event_type}.");
                    let config = EventConfig::from_stored(entry, &prefix, &mut dropped);
                    events.insert(event_type, config);
                }
            }
            Some(_) => dropped.push("events".to_string()),
        }

        let settings = Settings {
            persist_until,
            timer_disabled,
            events,
        };
        (settings, dropped)
    }
}

impl EventConfig {
    fn from_stored(
        mut stored: Map<String, Value>,
        prefix: &str,
        dropped: &mut Vec<String>,
    ) -> Self {
        EventConfig {
            disabled: take(&mut stored, "disabled", prefix, dropped),
            override_start_ms: take(&mut stored, "override_start_ms", prefix, dropped),
            display_mode: take(&mut stored, "display_mode", prefix, dropped),
            custom_label: take(&mut stored, "custom_label", prefix, dropped),
            event_over: take(&mut stored, "event_over", prefix, dropped),
        }
    }
}

fn take<T: DeserializeOwned>(
    stored: &mut Map<String, Value>,
    key: &str,
    prefix: &str,
    dropped: &mut Vec<String>,
) -> Option<T> {
    let value = stored.remove(key).filter(|v| !v.is_null())?;
    match serde_json::from_value(value) {
        Ok(value) => Some(value),
        Err(_) => {
            dropped.push(format!("{prefix}{key}"));
            None
        }
    }
}
