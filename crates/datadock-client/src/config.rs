//! API client configuration.

use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use datadock_core::{Error, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Default backend base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default timeout for HTTP requests: 30 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the backend API client.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ApiConfig {
    /// Base URL of the backend API
    #[cfg_attr(
        feature = "config",
        arg(long = "api-url", env = "API_BASE_URL", default_value = DEFAULT_BASE_URL)
    )]
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent with every request
    #[cfg_attr(
        feature = "config",
        arg(long = "api-token", env = "API_TOKEN", hide_env_values = true)
    )]
    #[serde(default)]
    pub token: Option<String>,

    /// File holding the bearer token, read on every request
    #[cfg_attr(
        feature = "config",
        arg(long = "api-token-file", env = "API_TOKEN_FILE")
    )]
    #[serde(default)]
    pub token_file: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "http-timeout", env = "HTTP_TIMEOUT", default_value = "30")
    )]
    #[serde(default = "default_timeout_secs")]
    pub http_timeout: u64,

    /// User-Agent header to send with requests
    #[cfg_attr(
        feature = "config",
        arg(long = "http-user-agent", env = "HTTP_USER_AGENT")
    )]
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("token_file", &self.token_file)
            .field("http_timeout", &self.http_timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            token_file: None,
            http_timeout: default_timeout_secs(),
            user_agent: None,
        }
    }
}

impl ApiConfig {
    /// Creates a configuration for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Parses the base URL.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the URL does not parse or its
    /// scheme is not http(s).
    pub fn parsed_base_url(&self) -> Result<Url> {
        let url = Url::parse(self.base_url.trim()).map_err(|e| {
            Error::configuration()
                .with_message(format!("Invalid API base URL '{}': {e}", self.base_url))
                .with_source(e)
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(Error::configuration().with_message(format!(
                "API base URL must use http or https, got '{scheme}'"
            ))),
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid base URL.
    pub fn validate(&self) -> Result<()> {
        self.parsed_base_url().map(|_| ())
    }

    /// Returns the effective timeout, using default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.http_timeout == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.http_timeout)
        }
    }

    /// Returns the effective user agent, using default if not set.
    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(Self::default_user_agent)
    }

    fn default_user_agent() -> String {
        format!("datadock/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Set the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the token file.
    #[must_use]
    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    /// Set the timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.http_timeout = timeout_secs;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use datadock_core::ErrorKind;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.effective_timeout(), Duration::from_secs(30));
        assert!(config.effective_user_agent().starts_with("datadock/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let config = ApiConfig::default().with_timeout(0);
        assert_eq!(
            config.effective_timeout(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_rejects_non_http_urls() {
        let err = ApiConfig::new("ftp://example.com").validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(ApiConfig::new("not a url").validate().is_err());
        assert!(ApiConfig::new("https://api.example.com").validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ApiConfig::default().with_token("super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_deserializes_with_defaults() {
        let config: ApiConfig = serde_json::from_str(r#"{"token": "t"}"#).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.http_timeout, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.token.as_deref(), Some("t"));
    }
}
