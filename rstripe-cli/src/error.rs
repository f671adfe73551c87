//! CLI error type.

use std::path::PathBuf;

/// Anything that makes a command fail.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The configuration file could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    ReadConfig {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`CliConfig`](crate::config::CliConfig).
    #[error("invalid configuration file: {0}")]
    ParseConfig(#[from] toml::de::Error),

    /// A `-p key=value` argument without `=`.
    #[error("parameter `{0}` is not of the form key=value")]
    Param(String),

    /// The JSON document given to `validate` does not parse.
    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    /// Client or call failure.
    #[error(transparent)]
    Client(#[from] rstripe::Error),

    /// Writing the result failed.
    #[error("cannot write output: {0}")]
    Output(#[from] std::io::Error),

    /// An offline command was sent down the networked path.
    #[error("`{0}` does not call the API")]
    Offline(&'static str),

    /// `validate` found violations.
    #[error("document does not match `{schema}` ({count} violations)")]
    Invalid {
        /// Schema the document was checked against.
        schema: String,
        /// Number of violations reported.
        count: usize,
    },
}

impl From<rstripe::ConfigError> for CliError {
    fn from(err: rstripe::ConfigError) -> Self {
        Self::Client(err.into())
    }
}

impl From<rstripe::RequestError> for CliError {
    fn from(err: rstripe::RequestError) -> Self {
        Self::Client(err.into())
    }
}
