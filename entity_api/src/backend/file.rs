use super::{Diagnostics, SettingsBackend};
use crate::error::Error;
use async_trait::async_trait;
use log::*;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Stores the document as a JSON file on local disk.
///
/// Writes land in a sibling temp file which is then renamed over the
/// target, so readers see either the old or the new document.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "settings.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

#[async_trait]
impl SettingsBackend for FileBackend {
    async fn read_raw(&self) -> Result<Option<String>, Error> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                warn!("Failed to read settings file {}: {e}", self.path.display());
                Err(e.into())
            }
        }
    }

    async fn write_raw(&self, json: String) -> Result<(), Error> {
        fs::create_dir_all(self.parent_dir()).await?;

        let temp_path = self.temp_path();
        fs::write(&temp_path, json).await?;
        fs::rename(&temp_path, &self.path).await?;

        trace!("Wrote settings file {}", self.path.display());
        Ok(())
    }

    async fn diagnostics(&self) -> Diagnostics {
        let probe = match fs::metadata(self.parent_dir()).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(format!("{} is not a directory", self.parent_dir().display())),
            Err(e) => Err(e.to_string()),
        };

        Diagnostics::new("file", Some(self.path.display().to_string()), None).with_probe(probe)
    }
}
