use crate::error::{CollectorError, Result};
use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// Upload endpoint used when no override is configured.
pub const DEFAULT_API_URL: &str = "https://analytics-api.buildkite.com/v1";

/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Variable holding the suite's API token.
pub const API_TOKEN_VAR: &str = "BUILDKITE_ANALYTICS_TOKEN";

/// Variable replacing the default endpoint (host and path prefix).
pub const API_URL_VAR: &str = "BUILDKITE_ANALYTICS_API_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    token: Option<String>,
    api_url: String,
    timeout: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl CollectorConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        // Try to load .env file if it exists (ignore if it doesn't)
        let _ = dotenvy::dotenv();

        Self::from_vars(env::vars())
    }

    /// Load configuration from an explicit set of variables
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();

        let token = vars.remove(API_TOKEN_VAR);
        let api_url = vars
            .remove(API_URL_VAR)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Self {
            token,
            api_url,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_token(self, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..self
        }
    }

    pub fn with_api_url(self, api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..self
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    /// Endpoint base URL, `/uploads` is appended to it.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The API token, unless it is missing or blank.
    ///
    /// A blank token means analytics are disabled rather than misconfigured.
    pub fn api_token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
    }

    /// Full URL uploads are posted to.
    pub fn uploads_url(&self) -> String {
        format!("{}/uploads", self.api_url.trim_end_matches('/'))
    }

    /// Check that the endpoint is at least an absolute http(s) URL.
    pub fn validate(&self) -> Result<()> {
        let url = self.api_url.trim();
        if url.starts_with("http://") || url.starts_with("https://") {
            Ok(())
        } else {
            Err(CollectorError::ConfigError(format!(
                "{} must be an http(s) URL, got {:?}",
                API_URL_VAR, self.api_url
            )))
        }
    }
}
