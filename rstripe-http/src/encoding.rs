//! Bracketed form encoding.
//!
//! The remote API takes flat `key=value` pairs, both in query strings and in
//! `application/x-www-form-urlencoded` bodies. Nested values are flattened
//! into bracketed keys:
//!
//! | value                                   | pairs                              |
//! |-----------------------------------------|------------------------------------|
//! | `{"decline_charge_on": {"cvc": true}}`  | `decline_charge_on[cvc]=true`      |
//! | `{"items": [{"price": "p"}]}`           | `items[0][price]=p`                |
//! | `{"description": null}`                 | `description=` (unset the field)   |
//!
//! Empty maps and empty sequences produce no pairs; send `null` to unset.

use rstripe::Params;
use serde_json::{Map, Value};
use url::form_urlencoded;

/// Flattens `params` into bracketed key/value pairs, in map order.
#[must_use]
pub fn flatten(params: &Params) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in params {
        flatten_value(key.clone(), value, &mut pairs);
    }
    pairs
}

fn flatten_value(key: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => pairs.push((key, String::new())),
        Value::Bool(b) => pairs.push((key, b.to_string())),
        Value::Number(n) => pairs.push((key, n.to_string())),
        Value::String(s) => pairs.push((key, s.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_value(format!("{key}[{index}]"), item, pairs);
            }
        }
        Value::Object(fields) => {
            for (field, item) in fields {
                flatten_value(format!("{key}[{field}]"), item, pairs);
            }
        }
    }
}

/// Encodes `params` as `application/x-www-form-urlencoded`.
///
/// The same encoding serves as a query string.
#[must_use]
pub fn encode(params: &Params) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(flatten(params))
        .finish()
}

/// Rebuilds a parameter map from bracketed pairs.
///
/// Inverse of [`flatten`] for string leaves: `a[b]=1` becomes
/// `{"a": {"b": "1"}}`, and a map whose keys are exactly `0..n` becomes a
/// sequence. Values stay strings; the remote service coerces them.
#[must_use]
pub fn unflatten<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Params
where
    K: AsRef<str>,
    V: Into<String>,
{
    let mut root = Map::new();
    for (key, value) in pairs {
        let segments = split_key(key.as_ref());
        insert(&mut root, &segments, Value::String(value.into()));
    }
    root.into_iter()
        .map(|(key, value)| (key, sequences_from_indices(value)))
        .collect()
}

/// Splits `a[b][0]` into `["a", "b", "0"]`. Malformed brackets stay literal.
fn split_key(key: &str) -> Vec<&str> {
    let Some(open) = key.find('[') else {
        return vec![key];
    };
    let mut segments = vec![&key[..open]];
    let mut rest = &key[open..];
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else {
            return vec![key];
        };
        segments.push(&inner[..close]);
        rest = &inner[close + 1..];
    }
    if rest.is_empty() { segments } else { vec![key] }
}

fn insert(map: &mut Map<String, Value>, segments: &[&str], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        map.insert((*first).to_owned(), value);
        return;
    }
    let child = map
        .entry((*first).to_owned())
        .or_insert_with(|| Value::Object(Map::new()));
    if !child.is_object() {
        *child = Value::Object(Map::new());
    }
    if let Value::Object(child) = child {
        insert(child, rest, value);
    }
}

fn sequences_from_indices(value: Value) -> Value {
    let Value::Object(fields) = value else {
        return value;
    };
    let fields: Map<String, Value> = fields
        .into_iter()
        .map(|(key, value)| (key, sequences_from_indices(value)))
        .collect();
    let is_sequence = !fields.is_empty()
        && (0..fields.len()).all(|index| fields.contains_key(&index.to_string()));
    if is_sequence {
        let mut fields = fields;
        Value::Array(
            (0..fields.len())
                .filter_map(|index| fields.remove(&index.to_string()))
                .collect(),
        )
    } else {
        Value::Object(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_flatten_nested_map() {
        assert_eq!(
            flatten(&params(json!({"decline_charge_on": {"avs_failure": true}}))),
            pairs(&[("decline_charge_on[avs_failure]", "true")])
        );
    }

    #[test]
    fn test_flatten_sequence_of_maps() {
        assert_eq!(
            flatten(&params(json!({"items": [{"price": "p"}, {"price": "q", "quantity": 2}]}))),
            pairs(&[
                ("items[0][price]", "p"),
                ("items[1][price]", "q"),
                ("items[1][quantity]", "2"),
            ])
        );
    }

    #[test]
    fn test_flatten_null_and_scalars() {
        assert_eq!(
            flatten(&params(json!({
                "amount": 500,
                "capture": false,
                "description": null,
                "email": "a@b.com"
            }))),
            pairs(&[
                ("amount", "500"),
                ("capture", "false"),
                ("description", ""),
                ("email", "a@b.com"),
            ])
        );
    }

    #[test]
    fn test_flatten_empty_containers() {
        assert!(flatten(&params(json!({"metadata": {}, "expand": []}))).is_empty());
    }

    #[test]
    fn test_encode_percent_encodes() {
        assert_eq!(
            encode(&params(json!({"metadata": {"order id": "a&b"}}))),
            "metadata%5Border+id%5D=a%26b"
        );
        assert_eq!(encode(&Params::new()), "");
    }

    #[test]
    fn test_unflatten_nests_and_builds_sequences() {
        let rebuilt = unflatten([
            ("type", "standard"),
            ("metadata[plan]", "gold"),
            ("items[0][price]", "p"),
            ("items[1][price]", "q"),
        ]);
        assert_eq!(
            Value::Object(rebuilt),
            json!({
                "type": "standard",
                "metadata": {"plan": "gold"},
                "items": [{"price": "p"}, {"price": "q"}]
            })
        );
    }

    #[test]
    fn test_unflatten_keeps_sparse_indices_as_map() {
        let rebuilt = unflatten([("a[1]", "x")]);
        assert_eq!(Value::Object(rebuilt), json!({"a": {"1": "x"}}));
    }

    #[test]
    fn test_unflatten_malformed_key_is_literal() {
        let rebuilt = unflatten([("a[b", "x"), ("c[d]e", "y")]);
        assert_eq!(Value::Object(rebuilt), json!({"a[b": "x", "c[d]e": "y"}));
    }

    #[test]
    fn test_unflatten_inverts_flatten_for_strings() {
        let original = params(json!({
            "customer": "cus_1",
            "shipping": {"address": {"city": "Berlin"}},
            "expand": ["customer", "invoice"]
        }));
        assert_eq!(unflatten(flatten(&original)), original);
    }
}
