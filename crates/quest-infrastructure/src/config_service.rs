//! Configuration service implementation.
//!
//! Loads [`ClientConfig`] from `config.toml`, then applies environment overrides.

use crate::paths::QuestPaths;
use quest_core::config::ClientConfig;
use quest_core::{QuestError, Result};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Overrides `api_url`.
pub const ENV_API_URL: &str = "QUEST_API_URL";
/// Overrides `log_level`.
pub const ENV_LOG_LEVEL: &str = "QUEST_LOG_LEVEL";

/// Loads and caches the client configuration.
///
/// A missing file yields the defaults. A file that exists but does not parse
/// is an error rather than a silent fallback.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    config: Arc<RwLock<Option<ClientConfig>>>,
}

impl ConfigService {
    pub fn new(paths: &QuestPaths) -> Self {
        Self::with_path(paths.config_file())
    }

    /// Creates a service reading from a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the configuration, loading it from disk if not cached.
    ///
    /// # Errors
    ///
    /// Returns `QuestError::Config` if the file cannot be read or parsed.
    pub fn get_config(&self) -> Result<ClientConfig> {
        {
            let cached = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(config) = cached.as_ref() {
                return Ok(config.clone());
            }
        }

        let mut loaded = self.load_file()?;
        apply_env_overrides(&mut loaded, |key| std::env::var(key).ok());

        let mut cached = self.config.write().unwrap_or_else(|e| e.into_inner());
        *cached = Some(loaded.clone());
        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut cached = self.config.write().unwrap_or_else(|e| e.into_inner());
        *cached = None;
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn load_file(&self) -> Result<ClientConfig> {
        if !self.path.exists() {
            tracing::debug!(
                "[ConfigService] No config at {}, using defaults",
                self.path.display()
            );
            return Ok(ClientConfig::default());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            QuestError::config(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            QuestError::config(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }
}

/// Applies `QUEST_*` overrides, looking variables up through `lookup`.
///
/// Blank values are ignored. A trailing slash on the API URL is stripped.
pub fn apply_env_overrides<F>(config: &mut ClientConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = non_blank(ENV_API_URL) {
        tracing::debug!("[ConfigService] {} overrides api_url", ENV_API_URL);
        config.api_url = url;
    }
    if let Some(level) = non_blank(ENV_LOG_LEVEL) {
        config.log_level = level;
    }
    let trimmed_len = config.api_url.trim_end_matches('/').len();
    config.api_url.truncate(trimmed_len);
}
