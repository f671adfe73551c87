#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the rstripe payment API client.
//!
//! This crate holds everything the request pipeline and the resource modules
//! share, without any HTTP dependency:
//!
//! - [`schema`] - Declarative shapes, composition operators and the read-only [`Registry`]
//! - [`operation`] - Immutable per-endpoint descriptors ([`Operation`])
//! - [`options`] - Per-call overrides ([`RequestOptions`])
//! - [`pending`] - Single-shot asynchronous results ([`PendingResult`])
//! - [`error`] - The error taxonomy (configuration, validation, transport, API)
//!
//! Wire types live in [`rstripe_proto`] and are re-exported as [`proto`].
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing events for registry construction

pub mod error;
pub mod operation;
pub mod options;
pub mod pending;
pub mod schema;

pub use rstripe_proto as proto;
pub use rstripe_proto::Params;

pub use error::{
    ApiError, ConfigError, Error, RequestError, SchemaError, TransportError, ValidationError,
};
pub use operation::{Method, Operation};
pub use options::RequestOptions;
pub use pending::{Outcome, PendingResult, Resolver};
pub use schema::{Candidate, Registry, RegistryBuilder, Schema, Violation, Violations};
