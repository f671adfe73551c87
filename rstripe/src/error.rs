//! Error types for the rstripe client.
//!
//! Failures fall into four families:
//!
//! - [`ConfigError`] - missing or invalid client configuration, reported at call time
//! - [`ValidationError`] - parameters failed their schema; never reaches the network
//! - [`TransportError`] - the exchange itself failed (network, timeout, undecodable body)
//! - [`ApiError`] - the remote service answered with a structured `error` payload
//!
//! The first two are returned synchronously. The last two are delivered
//! through a [`PendingResult`](crate::PendingResult) as a [`RequestError`].
//! [`Error`] unifies all of them for callers that just want `?`.

use std::fmt;

use rstripe_proto::ErrorDetail;
use serde_json::Value;

use crate::schema::Violations;

/// Boxed error used as the source of network failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Client configuration problems.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// No API key on the client and none passed with the request.
    #[error("no API key configured; set one on the client or pass it in the request options")]
    MissingApiKey,

    /// The API key cannot be sent as a credential.
    #[error("invalid API key: {0}")]
    InvalidApiKey(&'static str),

    /// The base URL cannot be parsed or is not HTTP(S).
    #[error("invalid base URL `{url}`: {reason}")]
    InvalidBaseUrl {
        /// The offending URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A header value (idempotency key, account, version) is not valid HTTP.
    #[error("invalid value for header {0}")]
    InvalidHeader(&'static str),

    /// An environment variable holds a value that cannot be used.
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// No async runtime is available to dispatch requests on.
    #[error("no tokio runtime available to dispatch requests")]
    NoRuntime,

    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] BoxError),
}

/// Caller-supplied parameters failed their declared schema.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid parameters for `{operation}`: {violations}")]
pub struct ValidationError {
    /// Name of the operation that rejected the parameters.
    pub operation: String,
    /// Every mismatch found.
    pub violations: Violations,
}

/// Malformed schema construction, fatal to startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum SchemaError {
    /// A name was defined twice.
    #[error("schema `{0}` is already defined")]
    DuplicateName(String),

    /// A definition failed its structural check.
    #[error("schema `{name}` is malformed: {source}")]
    Definition {
        /// Name being defined.
        name: String,
        /// What is wrong with it.
        #[source]
        source: Box<SchemaError>,
    },

    /// An enumeration with no values.
    #[error("enumeration has no values")]
    EmptyEnum,

    /// A one-of or all-of with no members.
    #[error("alternative list is empty")]
    EmptyAlternatives,

    /// A range or length bound with `min > max`.
    #[error("inverted bounds {0}")]
    InvertedBounds(String),

    /// A field-adding operator was applied to a non-object schema.
    #[error("`{op}` can only extend an object schema")]
    NotAnObject {
        /// The operator that was applied.
        op: &'static str,
    },

    /// A reference to an undefined name.
    #[error("schema `{schema}` refers to undefined schema `{reference}`")]
    UnresolvedReference {
        /// The definition containing the reference.
        schema: String,
        /// The undefined name.
        reference: String,
    },

    /// A chain of bare references loops.
    #[error("schema `{0}` is an alias cycle")]
    ReferenceCycle(String),
}

/// The exchange with the remote service failed.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TransportError {
    /// Connection, TLS or I/O failure.
    #[error("network error: {0}")]
    Network(#[source] BoxError),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The response body is not valid JSON.
    #[error("undecodable response body (HTTP {status}): {source}")]
    Decode {
        /// HTTP status of the response.
        status: u16,
        /// The decoder's complaint.
        #[source]
        source: serde_json::Error,
    },

    /// A success value could not be deserialized into the requested type.
    #[error("response does not deserialize into the requested type: {0}")]
    Deserialize(#[source] serde_json::Error),

    /// A non-2xx status with a decodable body but no `error` payload.
    #[error("unexpected HTTP status {status} without an error payload")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// The decoded body.
        body: Value,
    },

    /// A success payload that does not match the operation's result schema.
    #[error("response does not match `{schema}`: {violations}")]
    UnexpectedShape {
        /// Expected result schema name.
        schema: String,
        /// Every mismatch found.
        violations: Violations,
    },

    /// The worker handling the request stopped before delivering a result.
    #[error("request worker stopped before delivering a result")]
    Dropped,
}

impl TransportError {
    /// Wraps a decoder error.
    #[must_use]
    pub const fn decode(status: u16, source: serde_json::Error) -> Self {
        Self::Decode { status, source }
    }

    /// Wraps a network-level error.
    pub fn network(source: impl Into<BoxError>) -> Self {
        Self::Network(source.into())
    }
}

/// A structured failure reported by the remote service.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// HTTP status the error arrived with (may be 2xx).
    pub status: u16,
    /// The decoded `error` payload.
    pub detail: ErrorDetail,
}

impl ApiError {
    /// Builds an API error from the value found under `error`.
    #[must_use]
    pub fn from_payload(status: u16, error: &Value) -> Self {
        Self {
            status,
            detail: ErrorDetail::from_value(error),
        }
    }

    /// Error category (`type` on the wire).
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.detail.kind.as_deref()
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.detail.message.as_deref()
    }

    /// Machine-readable code.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.detail.code.as_deref()
    }

    /// Parameter the error relates to.
    #[must_use]
    pub fn param(&self) -> Option<&str> {
        self.detail.param.as_deref()
    }

    /// Issuer decline code.
    #[must_use]
    pub fn decline_code(&self) -> Option<&str> {
        self.detail.decline_code.as_deref()
    }

    /// Returns `true` for card declines and other `card_error`s.
    #[must_use]
    pub fn is_card_error(&self) -> bool {
        self.kind() == Some("card_error")
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API error (HTTP {})", self.status)?;
        if let Some(kind) = self.kind() {
            write!(f, " {kind}")?;
        }
        if let Some(code) = self.code() {
            write!(f, " [{code}]")?;
        }
        if let Some(message) = self.message() {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// What a [`PendingResult`](crate::PendingResult) resolves to on failure.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The remote service reported an error.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The exchange itself failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl RequestError {
    /// Returns the API error, if that is what this is.
    #[must_use]
    pub const fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            Self::Transport(_) => None,
        }
    }

    /// Returns the transport error, if that is what this is.
    #[must_use]
    pub const fn as_transport(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(err) => Some(err),
            Self::Api(_) => None,
        }
    }

    /// Returns `true` if the request timed out.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Timeout))
    }
}

/// Any failure of a client call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Parameters failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request was sent and failed.
    #[error(transparent)]
    Request(#[from] RequestError),
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        Self::Request(RequestError::Api(err))
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Self::Request(RequestError::Transport(err))
    }
}
