//! Per-call request options.

use std::fmt;

use rstripe_proto::Params;
use serde_json::Value;

/// Overrides and parameters for a single call.
///
/// Every field is optional. Options are merged over the client defaults
/// when the request is built: a per-call `api_key` replaces the client key
/// for that call only.
#[derive(Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Request parameters, sent as a query string (GET/DELETE) or form body (POST).
    pub params: Params,
    /// API key for this call only.
    pub api_key: Option<String>,
    /// Key that makes a retried POST safe to replay.
    pub idempotency_key: Option<String>,
    /// Connected account to act on behalf of.
    pub stripe_account: Option<String>,
    /// API version for this call only.
    pub api_version: Option<String>,
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("params", &self.params)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("idempotency_key", &self.idempotency_key)
            .field("stripe_account", &self.stripe_account)
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl From<Params> for RequestOptions {
    fn from(params: Params) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }
}

impl RequestOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the parameter map.
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Sets one parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Sets a parameter only if the caller did not supply it.
    #[must_use]
    pub fn default_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.entry(key.into()).or_insert_with(|| value.into());
        self
    }

    /// Uses `api_key` for this call.
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sends an `Idempotency-Key` header.
    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Acts on behalf of a connected account.
    #[must_use]
    pub fn stripe_account(mut self, account: impl Into<String>) -> Self {
        self.stripe_account = Some(account.into());
        self
    }

    /// Pins the API version for this call.
    #[must_use]
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Returns the string value of parameter `key`, if set to a string.
    #[must_use]
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }
}
