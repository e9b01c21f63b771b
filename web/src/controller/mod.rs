use crate::Error;
use serde_json::{Map, Value};

pub(crate) mod db_health_controller;
pub(crate) mod event_controller;
pub(crate) mod health_check_controller;
pub(crate) mod settings_controller;

/// Decodes a request body, reading an empty body as `{}`. Whether the value
/// is an acceptable object is decided by the domain.
pub(crate) fn json_body(body: &[u8]) -> Result<Value, Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    Ok(serde_json::from_slice(body)?)
}
