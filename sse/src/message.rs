use serde::Serialize;
use serde_json::Value;

/// Wire form of the in-band error message, kept as a literal so it can be
/// sent even when serialization itself is what failed.
pub const SERIALIZATION_ERROR_JSON: &str = r#"{"type":"error","message":"serialization_error"}"#;

/// Trait for getting the message type name
pub trait EventType {
    fn event_type(&self) -> &'static str;
}

/// Messages pushed to stream subscribers, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// Sent once, first, on every new stream.
    Init { settings: Value },
    /// Sent on every broadcast after a settings mutation.
    Settings { settings: Value },
    /// Substituted for a message that could not be serialized.
    Error { message: String },
}

impl EventType for Message {
    fn event_type(&self) -> &'static str {
        match self {
            Message::Init { .. } => "init",
            Message::Settings { .. } => "settings",
            Message::Error { .. } => "error",
        }
    }
}
