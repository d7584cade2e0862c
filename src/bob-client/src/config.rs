//! Client configuration.
//!
//! Supports loading configuration from:
//! - TOML files
//! - Environment variables (`BOB_*`)
//!
//! Every field has a default, so an empty file or environment yields a client
//! pointed at a local backend.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ClientError, Result};
use crate::{DEFAULT_BASE_URL, DEFAULT_ERROR_PLACEHOLDER};

/// Configuration for a [`ConversationClient`](crate::ConversationClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the conversation backend (e.g., "http://localhost:5000").
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Total request timeout in seconds. Generation can be slow.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Text stored as the bot reply when a send fails.
    #[serde(default = "default_error_placeholder")]
    pub error_placeholder: String,

    /// Re-read the pre-prompt from the server before every send instead of
    /// using the locally cached one.
    #[serde(default)]
    pub refresh_pre_prompt_before_send: bool,

    /// Capacity of the event broadcast channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_error_placeholder() -> String {
    DEFAULT_ERROR_PLACEHOLDER.to_string()
}

fn default_event_capacity() -> usize {
    64
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            error_placeholder: default_error_placeholder(),
            refresh_pre_prompt_before_send: false,
            event_capacity: default_event_capacity(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given base URL with default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            ClientError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        debug!("Loaded client config from {}", path.display());
        Ok(config)
    }

    /// Load from environment variables.
    ///
    /// Recognized variables:
    /// - `BOB_BASE_URL`
    /// - `BOB_TIMEOUT_SECS`
    /// - `BOB_ERROR_PLACEHOLDER`
    /// - `BOB_REFRESH_PRE_PROMPT`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from `BOB_*` environment variables that are set.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("BOB_BASE_URL") {
            self.base_url = url;
        }

        if let Ok(timeout) = std::env::var("BOB_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(secs) => self.timeout_secs = secs,
                Err(_) => warn!("Ignoring invalid BOB_TIMEOUT_SECS: {}", timeout),
            }
        }

        if let Ok(placeholder) = std::env::var("BOB_ERROR_PLACEHOLDER") {
            self.error_placeholder = placeholder;
        }

        if let Ok(refresh) = std::env::var("BOB_REFRESH_PRE_PROMPT") {
            self.refresh_pre_prompt_before_send = refresh.parse().unwrap_or(false);
        }
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the error placeholder.
    pub fn with_error_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.error_placeholder = placeholder.into();
        self
    }

    /// Enable or disable refreshing the pre-prompt before each send.
    pub fn with_pre_prompt_refresh(mut self, enabled: bool) -> Self {
        self.refresh_pre_prompt_before_send = enabled;
        self
    }

    /// Get the request timeout as Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the connect timeout as Duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.base_url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ClientError::Config(format!(
                "Base URL must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.error_placeholder.trim().is_empty() {
            return Err(ClientError::Config(
                "Error placeholder must not be empty".to_string(),
            ));
        }
        if self.timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(ClientError::Config(
                "Timeouts must be at least 1 second".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(ClientError::Config(
                "Event capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.error_placeholder, DEFAULT_ERROR_PLACEHOLDER);
        assert!(!config.refresh_pre_prompt_before_send);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url = \"http://10.0.0.2:5000\"").unwrap();
        writeln!(file, "refresh_pre_prompt_before_send = true").unwrap();

        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!(config.base_url, "http://10.0.0.2:5000");
        assert!(config.refresh_pre_prompt_before_send);
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn test_load_missing_file() {
        let result = ClientConfig::load("/nonexistent/bob.toml");
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        assert!(ClientConfig::new("not a url").validate().is_err());
        assert!(ClientConfig::new("ftp://example.com").validate().is_err());
        assert!(ClientConfig::new("https://example.com/api").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_placeholder() {
        let config = ClientConfig::default().with_error_placeholder("  ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let mut config = ClientConfig::default();
        config.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));

        let mut config = ClientConfig::default();
        config.connect_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));
    }
}
