//! Paginated list envelope.

use serde::{Deserialize, Serialize};

/// A page of objects returned by a `list` endpoint.
///
/// ```json
/// {"object": "list", "has_more": false, "url": "/v1/charges", "data": []}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List<T> {
    /// Always `"list"`.
    pub object: String,

    /// Whether more items exist after the last one in `data`.
    pub has_more: bool,

    /// Path of the endpoint that produced this page.
    pub url: String,

    /// The items of this page, in API order.
    pub data: Vec<T>,

    /// Total number of items across all pages, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,

    /// Number of items in this page, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl<T> List<T> {
    /// Creates an empty final page for the given endpoint path.
    #[must_use]
    pub fn empty(url: impl Into<String>) -> Self {
        Self {
            object: crate::LIST_OBJECT.to_owned(),
            has_more: false,
            url: url.into(),
            data: Vec::new(),
            total_count: None,
            count: None,
        }
    }

    /// Returns the id-bearing cursor for the next page, if any.
    ///
    /// The remote API paginates with `starting_after=<last id>`; this
    /// returns the value to pass when `has_more` is set.
    pub fn next_cursor<'a>(&'a self, id_of: impl Fn(&'a T) -> Option<&'a str>) -> Option<&'a str> {
        if !self.has_more {
            return None;
        }
        self.data.last().and_then(id_of)
    }

    /// Returns `true` if the page carries no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of items in this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }
}

impl<T> IntoIterator for List<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_list_deserialize_with_counts() {
        let list: List<Value> = serde_json::from_value(json!({
            "object": "list",
            "has_more": true,
            "url": "/v1/customers",
            "data": [{"id": "cus_1"}, {"id": "cus_2"}],
            "total_count": 10
        }))
        .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.total_count, Some(10));
        assert_eq!(list.count, None);
    }

    #[test]
    fn test_next_cursor_uses_last_id() {
        let list: List<Value> = serde_json::from_value(json!({
            "object": "list",
            "has_more": true,
            "url": "/v1/customers",
            "data": [{"id": "cus_1"}, {"id": "cus_2"}]
        }))
        .unwrap();
        let cursor = list.next_cursor(|item| item.get("id").and_then(Value::as_str));
        assert_eq!(cursor, Some("cus_2"));
    }

    #[test]
    fn test_next_cursor_none_on_last_page() {
        let list: List<Value> = List::empty("/v1/charges");
        assert!(list.is_empty());
        assert_eq!(list.next_cursor(|item| item.as_str()), None);
    }

    #[test]
    fn test_empty_serializes_without_counts() {
        let value = serde_json::to_value(List::<Value>::empty("/v1/charges")).unwrap();
        assert_eq!(
            value,
            json!({"object": "list", "has_more": false, "url": "/v1/charges", "data": []})
        );
    }
}
