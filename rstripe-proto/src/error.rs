//! Structured error payload returned by the remote service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level error envelope: `{"error": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// The reported error.
    pub error: ErrorDetail,
}

/// Failure cause reported by the remote service.
///
/// Every field is optional on the wire; unknown fields are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Error category (e.g. `"card_error"`, `"invalid_request_error"`).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Machine-readable code (e.g. `"card_declined"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Name of the parameter the error relates to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,

    /// Issuer decline code for card errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decline_code: Option<String>,

    /// Any other fields the service sent.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ErrorDetail {
    /// Builds an error detail from whatever the service put under `error`.
    ///
    /// An object is decoded field by field; a bare string becomes the
    /// message; anything else is kept verbatim in `extra["error"]`.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(_) => serde_json::from_value(value.clone()).unwrap_or_else(|_| Self {
                extra: value.as_object().cloned().unwrap_or_default(),
                ..Self::default()
            }),
            Value::String(message) => Self {
                message: Some(message.clone()),
                ..Self::default()
            },
            other => {
                let mut extra = serde_json::Map::new();
                extra.insert("error".to_owned(), other.clone());
                Self {
                    extra,
                    ..Self::default()
                }
            }
        }
    }
}
