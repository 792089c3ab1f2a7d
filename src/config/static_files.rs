//! Static file configuration

use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

use super::error::ValidationError;

/// Document root for the client application
#[derive(Debug, Clone, Deserialize)]
pub struct StaticConfig {
    /// Directory served for non-upgrade requests
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// File served for `/`, relative to `root`
    #[serde(default = "default_entry_file")]
    pub entry_file: String,
}

impl StaticConfig {
    /// Validate static file configuration
    ///
    /// The entry file must be a single plain file name inside the root.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut components = Path::new(&self.entry_file).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(()),
            _ => Err(ValidationError::InvalidEntryFile(self.entry_file.clone())),
        }
    }

    /// Full path of the entry file
    pub fn entry_path(&self) -> PathBuf {
        self.root.join(&self.entry_file)
    }
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            entry_file: default_entry_file(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("../web")
}

fn default_entry_file() -> String {
    "crdt_note_editor.html".to_string()
}
