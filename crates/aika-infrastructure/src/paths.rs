//! Unified path management for AIKA files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/aika/              # Config directory
//! ├── config.toml              # Application configuration
//! └── logs/                    # Application logs
//!     └── aika.log.YYYY-MM-DD
//!
//! ~/.local/share/aika/         # Data directory
//! ├── storage/                 # Key-value store, one JSON file per key
//! │   ├── conversations.json
//! │   ├── uploadedFiles.json
//! │   └── aika_user.json
//! └── exports/                 # Exported chats
//! ```

use aika_core::{AikaError, Result};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "aika";

/// Resolved locations of every file the client reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AikaPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl AikaPaths {
    /// Resolves the platform directories (XDG on Linux).
    ///
    /// # Errors
    ///
    /// Returns a config error when the home directory cannot be determined.
    pub fn resolve() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AikaError::config("Cannot find config directory"))?
            .join(APP_DIR);
        let data_dir = dirs::data_dir()
            .ok_or_else(|| AikaError::config("Cannot find data directory"))?
            .join(APP_DIR);
        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    /// Places everything under `root`.
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
        }
    }

    /// Replaces the data directory, keeping configuration where it is.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.config_dir.join("logs")
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.data_dir.join("storage")
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }
}
