//! Session persistence configuration.

use serde::{Deserialize, Serialize};

/// Where the token and subject summary survive a reload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStoreKind {
    /// Process memory, shared by all surfaces of a runtime.
    #[default]
    Memory,
    /// A JSON file on disk.
    File,
}

/// Session persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Store backend.
    #[serde(default)]
    pub store: SessionStoreKind,
    /// File used by the `file` backend.
    #[serde(default = "default_file_path")]
    pub file_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store: SessionStoreKind::default(),
            file_path: default_file_path(),
        }
    }
}

fn default_file_path() -> String {
    "data/session.json".to_string()
}
