pub mod document;
pub mod patch;
pub mod settings;

pub use document::{EventConfig, Settings};
pub use patch::{EventConfigPatch, SettingsPatch};

/// Primary key of the one and only settings row.
pub const SETTINGS_ROW_ID: i32 = 1;
