//! Client configuration loaded from the environment.

use crate::error::ClientError;
use std::fmt;
use std::time::Duration;

/// Base URL used when `MARKETPLACE_API_URL` is unset
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Request timeout used when `MARKETPLACE_API_TIMEOUT_SECS` is unset
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the marketplace REST backend
#[derive(Clone)]
pub struct ClientConfig {
    /// Backend origin, without a trailing slash
    pub base_url: String,
    /// Bearer credential attached to every request
    pub token: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientConfig {
    /// Create a configuration with default URL and timeout
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Point at another backend origin
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use another request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load configuration from process environment variables
    ///
    /// - `MARKETPLACE_API_URL` (default [`DEFAULT_API_URL`])
    /// - `MARKETPLACE_API_TOKEN` (required)
    /// - `MARKETPLACE_API_TIMEOUT_SECS` (default 30)
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup` (the environment, a map in tests)
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The token is missing or blank → [`ClientError::MissingToken`]
    /// - The URL is not `http(s)://` or the timeout is not a positive integer
    ///   → [`ClientError::InvalidConfig`]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let token = lookup("MARKETPLACE_API_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .ok_or(ClientError::MissingToken)?;

        let mut config = Self::new(token.trim());

        if let Some(url) = lookup("MARKETPLACE_API_URL") {
            let url = url.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ClientError::InvalidConfig(format!(
                    "MARKETPLACE_API_URL must start with http:// or https://, got '{url}'"
                )));
            }
            config = config.with_base_url(url);
        }

        if let Some(raw) = lookup("MARKETPLACE_API_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    ClientError::InvalidConfig(format!(
                        "MARKETPLACE_API_TIMEOUT_SECS must be a positive integer, got '{raw}'"
                    ))
                })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }
}
