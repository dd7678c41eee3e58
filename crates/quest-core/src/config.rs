use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Client configuration, loaded from `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the quest backend, without a trailing slash.
    pub api_url: String,
    /// Deadline for every remote call.
    pub request_timeout_secs: u64,
    pub feed_page_size: u32,
    pub log_level: String,
    /// Discard refresh responses that were overtaken by a later refresh.
    pub refresh_sequencing: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 15,
            feed_page_size: 20,
            log_level: "info".to_string(),
            refresh_sequencing: true,
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
