//! Client configuration.
//!
//! A [`ClientConfig`] is built once and frozen inside a
//! [`Client`](crate::Client). Per-call overrides travel in
//! [`RequestOptions`](rstripe::RequestOptions) instead.
//!
//! # Environment Variables
//!
//! [`ClientConfig::from_env`] reads:
//!
//! - `STRIPE_API_KEY` - Secret API key
//! - `STRIPE_API_BASE` - API host (default: `https://api.stripe.com`)
//! - `STRIPE_TIMEOUT_SECS` - Per-request timeout in seconds (default: `80`, `0` disables)
//! - `STRIPE_API_VERSION` - API version sent with every request

use std::fmt;
use std::time::Duration;

use rstripe::ConfigError;
use url::Url;

use crate::constants::{
    DEFAULT_API_BASE, DEFAULT_MAX_IN_FLIGHT, DEFAULT_TIMEOUT_SECS, ENV_API_BASE, ENV_API_KEY,
    ENV_API_VERSION, ENV_TIMEOUT_SECS, USER_AGENT,
};

/// Process-wide defaults for a client.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    api_key: Option<String>,
    base_url: Url,
    timeout: Option<Duration>,
    max_in_flight: usize,
    api_version: Option<String>,
    validate_responses: bool,
    user_agent: String,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("max_in_flight", &self.max_in_flight)
            .field("api_version", &self.api_version)
            .field("validate_responses", &self.validate_responses)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            api_version: None,
            validate_responses: true,
            user_agent: USER_AGENT.to_owned(),
        }
    }
}

#[allow(clippy::expect_used)]
fn default_base_url() -> Url {
    Url::parse(DEFAULT_API_BASE)
        .and_then(|url| url.join("/"))
        .expect("default API base is a valid URL")
}

impl ClientConfig {
    /// Creates a configuration with `api_key` and every other setting at its default.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::default().with_api_key(api_key)
    }

    /// Reads the configuration from the process environment.
    ///
    /// Unset variables keep their defaults; a missing API key is not an
    /// error here, it is reported when a call has no key to send.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let lookup = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();
        if let Some(key) = lookup(ENV_API_KEY) {
            config = config.with_api_key(key.trim());
        }
        if let Some(base) = lookup(ENV_API_BASE) {
            config = config.with_base_url(&base)?;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|e| ConfigError::InvalidEnv {
                var: ENV_TIMEOUT_SECS,
                reason: format!("{e}"),
            })?;
            config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(version) = lookup(ENV_API_VERSION) {
            config = config.with_api_version(version.trim());
        }
        Ok(config)
    }

    /// Sets the default API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Points the client at another host, e.g. a local mock.
    ///
    /// A trailing slash is normalised so resource paths join under it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if `base_url` does not parse
    /// or is not an `http(s)` URL.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason,
        };
        let mut normalized = base_url.trim().trim_end_matches('/').to_owned();
        normalized.push('/');
        let url = Url::parse(&normalized).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
        }
        if url.cannot_be_a_base() {
            return Err(invalid("not a base URL".to_owned()));
        }
        self.base_url = url;
        Ok(self)
    }

    /// Bounds each request; `None` waits indefinitely.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Bounds how many requests may be in flight at once (at least one).
    #[must_use]
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Pins the API version for every request.
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Enables or disables checking results against their declared schema.
    #[must_use]
    pub const fn with_validate_responses(mut self, validate: bool) -> Self {
        self.validate_responses = validate;
        self
    }

    /// Overrides the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Default API key, if any.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Base URL, always ending in `/`.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Bound on requests in flight.
    #[must_use]
    pub const fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Default API version, if pinned.
    #[must_use]
    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    /// Whether results are checked against their declared schema.
    #[must_use]
    pub const fn validate_responses(&self) -> bool {
        self.validate_responses
    }

    /// `User-Agent` header value.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}
