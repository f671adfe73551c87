//! CLI configuration file.
//!
//! Settings come from a TOML file, the environment and command-line flags,
//! later sources overriding earlier ones. String values in the file may
//! reference environment variables as `$VAR` or `${VAR}`.
//!
//! ```toml
//! api_key = "${STRIPE_SECRET}"
//! base_url = "http://localhost:12111"
//! timeout_secs = 30
//! max_in_flight = 8
//! api_version = "2024-06-20"
//! validate_responses = true
//! ```
//!
//! # Environment Variables
//!
//! - `RSTRIPE_CONFIG` - Path to the configuration file (default: `rstripe.toml`)
//! - `STRIPE_API_KEY`, `STRIPE_API_BASE`, `STRIPE_TIMEOUT_SECS`, `STRIPE_API_VERSION` -
//!   Override the matching file settings

use std::path::{Path, PathBuf};

use rstripe::ConfigError;
use rstripe_http::ClientConfig;
use rstripe_http::constants::{ENV_API_BASE, ENV_API_KEY, ENV_API_VERSION, ENV_TIMEOUT_SECS};
use serde::Deserialize;

use crate::error::CliError;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "RSTRIPE_CONFIG";

/// Configuration file used when none is named.
pub const DEFAULT_CONFIG_PATH: &str = "rstripe.toml";

/// Contents of the configuration file; every setting is optional.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Secret API key.
    pub api_key: Option<String>,
    /// API host.
    pub base_url: Option<String>,
    /// Per-request timeout in seconds; `0` disables it.
    pub timeout_secs: Option<u64>,
    /// Bound on requests in flight.
    pub max_in_flight: Option<usize>,
    /// API version sent with every request.
    pub api_version: Option<String>,
    /// Whether results are checked against their declared schema.
    pub validate_responses: Option<bool>,
}

impl std::fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_in_flight", &self.max_in_flight)
            .field("api_version", &self.api_version)
            .field("validate_responses", &self.validate_responses)
            .finish()
    }
}

impl CliConfig {
    /// Loads the file named by `path`, else by `RSTRIPE_CONFIG`, else
    /// `rstripe.toml`.
    ///
    /// The default file may be absent, in which case every setting is left
    /// unset. A file that was named explicitly must exist.
    ///
    /// # Errors
    ///
    /// Returns [`CliError`] if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let named = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        let (path, required) = match named {
            Some(path) => (path, true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        if !required && !path.exists() {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|source| CliError::ReadConfig { path, source })?;
        Self::parse(&content, |var| std::env::var(var).ok())
    }

    /// Parses TOML `content` after expanding variable references.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::ParseConfig`] for invalid TOML or unknown keys.
    pub fn parse(content: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CliError> {
        Ok(toml::from_str(&expand_vars(content, lookup))?)
    }

    /// Value this file supplies for one of the client's environment variables.
    fn fallback(&self, var: &str) -> Option<String> {
        match var {
            ENV_API_KEY => self.api_key.clone(),
            ENV_API_BASE => self.base_url.clone(),
            ENV_TIMEOUT_SECS => self.timeout_secs.map(|secs| secs.to_string()),
            ENV_API_VERSION => self.api_version.clone(),
            _ => None,
        }
    }

    /// Resolves the client configuration: environment values from `env`
    /// win over the file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a resolved value is unusable.
    pub fn resolve(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<ClientConfig, ConfigError> {
        let mut config = ClientConfig::from_lookup(|var| {
            env(var)
                .filter(|value| !value.trim().is_empty())
                .or_else(|| self.fallback(var))
        })?;
        if let Some(max_in_flight) = self.max_in_flight {
            config = config.with_max_in_flight(max_in_flight);
        }
        if let Some(validate) = self.validate_responses {
            config = config.with_validate_responses(validate);
        }
        Ok(config)
    }
}

/// Replaces `$VAR` and `${VAR}` with values from `lookup`.
///
/// References that `lookup` cannot resolve, and a `$` not followed by a
/// name, are kept verbatim.
fn expand_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(dollar) = rest.find('$') {
        out.push_str(&rest[..dollar]);
        let after = &rest[dollar + 1..];
        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(close) => (&braced[..close], close + 2),
                None => ("", 0),
            }
        } else {
            let len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..len], len)
        };
        match lookup(name).filter(|_| !name.is_empty()) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[dollar..=dollar + consumed]),
        }
        rest = &after[consumed..];
    }
    out.push_str(rest);
    out
}
