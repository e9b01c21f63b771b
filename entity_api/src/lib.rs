pub use entity::{EventConfig, EventConfigPatch, Settings, SettingsPatch};

pub mod backend;
pub mod error;
pub mod settings;

pub use backend::{DatabaseBackend, Diagnostics, FileBackend, MemoryBackend, SettingsBackend};
pub use settings::{SettingsStore, SettingsWriter};
