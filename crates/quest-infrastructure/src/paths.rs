//! Path management for the quest client's local files.

use quest_core::{QuestError, Result};
use std::path::{Path, PathBuf};

/// Locations of every file the client keeps on disk.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/quest/             # Config directory (platform default)
/// ├── config.toml              # Client configuration
/// ├── session.json             # Stored identity and refresh token
/// └── logs/                    # Application logs
///     └── quest.log.YYYY-MM-DD
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestPaths {
    root: PathBuf,
}

impl QuestPaths {
    /// Resolves the platform config directory (XDG on Linux).
    ///
    /// # Errors
    ///
    /// Returns `QuestError::Config` if no config directory can be determined.
    pub fn resolve() -> Result<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| QuestError::config("Cannot find config directory"))?;
        Ok(Self::at(base.join("quest")))
    }

    /// Uses `root` as the config directory.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn config_dir(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// # Security Note
    ///
    /// The file holds a refresh token. It is written with mode 600 on Unix.
    pub fn session_file(&self) -> PathBuf {
        self.root.join("session.json")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}
