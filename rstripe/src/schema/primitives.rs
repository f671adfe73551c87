//! Named primitives shared by every resource.
//!
//! [`Registry::builder`](super::Registry::builder) registers all of these
//! under the names below, so resource schemas can refer to them with
//! [`Schema::reference`].

use super::Schema;

/// ISO 4217 currency code, three characters (`usd`).
pub const CURRENCY: &str = "currency";
/// ISO 3166-1 alpha-2 country code (`US`).
pub const COUNTRY: &str = "country";
/// Seconds since the Unix epoch.
pub const UNIX_TIMESTAMP: &str = "unix_timestamp";
/// Text shown on the customer's statement, at most 22 characters.
pub const STATEMENT_DESCRIPTOR: &str = "statement_descriptor";
/// Last four digits of a card or account number.
pub const LAST4: &str = "last4";
/// Caller-supplied key/value annotations.
pub const METADATA: &str = "metadata";
/// Result of a deletion.
pub const DELETED: &str = "deleted";
/// Object identifier.
pub const ID: &str = "id";

/// Longest accepted statement descriptor.
pub const STATEMENT_DESCRIPTOR_MAX: usize = 22;

/// Metadata maps must hold fewer than this many entries.
pub const METADATA_ENTRY_LIMIT: usize = 20;

/// Three-character currency code.
#[must_use]
pub const fn currency() -> Schema {
    Schema::fixed_len(3)
}

/// Two-character country code.
#[must_use]
pub const fn country() -> Schema {
    Schema::fixed_len(2)
}

/// Non-negative integer seconds.
#[must_use]
pub const fn unix_timestamp() -> Schema {
    Schema::int_range(Some(0), None)
}

/// String of at most 22 characters.
#[must_use]
pub const fn statement_descriptor() -> Schema {
    Schema::max_len(STATEMENT_DESCRIPTOR_MAX)
}

/// Four-character string.
#[must_use]
pub const fn last4() -> Schema {
    Schema::fixed_len(4)
}

/// String-valued map with fewer than 20 entries.
#[must_use]
pub fn metadata() -> Schema {
    Schema::map_of(Schema::string(), Some(METADATA_ENTRY_LIMIT - 1))
}

/// `{"deleted": "true", "id": <id>}`; the flag is the string `"true"`.
#[must_use]
pub fn deleted() -> Schema {
    Schema::object()
        .required(
            "deleted",
            Schema::literal(rstripe_proto::DeletedFlag::VALUE),
        )
        .required("id", id())
        .into()
}

/// Non-empty string.
#[must_use]
pub const fn id() -> Schema {
    Schema::string_len(Some(1), None)
}

/// Every primitive above paired with its registry name.
pub(crate) fn all() -> [(&'static str, Schema); 8] {
    [
        (CURRENCY, currency()),
        (COUNTRY, country()),
        (UNIX_TIMESTAMP, unix_timestamp()),
        (STATEMENT_DESCRIPTOR, statement_descriptor()),
        (LAST4, last4()),
        (METADATA, metadata()),
        (DELETED, deleted()),
        (ID, id()),
    ]
}
