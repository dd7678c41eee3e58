//! Persisted session storage (`session.json`).

use crate::paths::QuestPaths;
use quest_core::Result;
use quest_core::session::UserSession;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What survives a restart: the identity plus the refresh token.
///
/// The access token is never written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub user_ulid: String,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub level: u32,
    pub avatar_url: Option<String>,
    pub refresh_token: String,
}

impl StoredSession {
    pub fn user_session(&self) -> UserSession {
        UserSession {
            user_ulid: self.user_ulid.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            level: self.level,
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// Reads and writes the stored session file.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(paths: &QuestPaths) -> Self {
        Self::with_path(paths.session_file())
    }

    /// Creates a SessionFile with a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Loads the stored session.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(session))`: a session was stored
    /// - `Ok(None)`: no session file
    /// - `Err(_)`: the file exists but could not be read or parsed
    pub async fn load(&self) -> Result<Option<StoredSession>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub async fn save(&self, session: &StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(session)?;
        tokio::fs::write(&self.path, json).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&self.path, permissions).await?;
        }

        tracing::debug!("[SessionFile] Stored session for {}", session.user_ulid);
        Ok(())
    }

    /// Deletes the stored session. Deleting a missing file is not an error.
    pub async fn delete(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
