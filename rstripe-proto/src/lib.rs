//! Wire format types for the rstripe payment API client.
//!
//! This crate defines the serialization-level data structures exchanged with
//! the remote payment API. It has minimal dependencies (only `serde` and
//! `serde_json`) and is shared by every other crate in the workspace.
//!
//! # Modules
//!
//! - [`list`] - Paginated list envelope (`{"object": "list", ...}`)
//! - [`deleted`] - Deletion result marker (`{"deleted": "true", "id": ...}`)
//! - [`error`] - Structured error payload returned by the remote service

pub mod deleted;
pub mod error;
pub mod list;

pub use deleted::{Deleted, DeletedFlag};
pub use error::{ErrorBody, ErrorDetail};
pub use list::List;

/// Request parameters and decoded objects: string keys, JSON values.
///
/// Field names are kept exactly as the remote service spells them
/// (`snake_case`); no case translation happens anywhere in the stack.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// API path prefix shared by every resource.
pub const API_PREFIX: &str = "/v1";

/// Object type tag carried by list envelopes.
pub const LIST_OBJECT: &str = "list";
