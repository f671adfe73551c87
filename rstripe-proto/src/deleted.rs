//! Deletion result marker.
//!
//! The remote service answers a successful `DELETE` with
//! `{"deleted": "true", "id": "<id>"}`. The flag is the *string* `"true"`,
//! not a JSON boolean, and is matched literally.

use serde::{Deserialize, Serialize};

/// A unit struct representing the string literal `"true"` of a deletion result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeletedFlag;

impl DeletedFlag {
    /// The string literal value: `"true"`.
    pub const VALUE: &'static str = "true";
}

impl std::fmt::Display for DeletedFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(Self::VALUE)
    }
}

impl AsRef<str> for DeletedFlag {
    fn as_ref(&self) -> &str {
        Self::VALUE
    }
}

impl std::str::FromStr for DeletedFlag {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::VALUE {
            Ok(Self)
        } else {
            Err(format!("expected '{}', got '{s}'", Self::VALUE))
        }
    }
}

impl Serialize for DeletedFlag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(Self::VALUE)
    }
}

impl<'de> Deserialize<'de> for DeletedFlag {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Result of a successful deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted {
    /// Always the string `"true"`.
    pub deleted: DeletedFlag,

    /// Id of the deleted object.
    pub id: String,
}

impl Deleted {
    /// Creates a deletion marker for `id`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            deleted: DeletedFlag,
            id: id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deleted_accepts_string_true() {
        let deleted: Deleted =
            serde_json::from_value(json!({"deleted": "true", "id": "acct_1"})).unwrap();
        assert_eq!(deleted, Deleted::new("acct_1"));
    }

    #[test]
    fn test_deleted_rejects_boolean_true() {
        let result: Result<Deleted, _> =
            serde_json::from_value(json!({"deleted": true, "id": "acct_1"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_deleted_serializes_flag_as_string() {
        let value = serde_json::to_value(Deleted::new("cus_9")).unwrap();
        assert_eq!(value, json!({"deleted": "true", "id": "cus_9"}));
    }
}
