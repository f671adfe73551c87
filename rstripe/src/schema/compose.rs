//! Schema composition operators.
//!
//! Every operator takes a schema by value and returns a new one; nothing is
//! registered or mutated. Operators that add fields require an object
//! schema (or a conjunction containing one) and report
//! [`SchemaError::NotAnObject`] otherwise.

use serde_json::Value;

use super::{ObjectSchema, Schema, primitives};
use crate::error::SchemaError;

/// Name of the discriminator field carried by every API object.
pub const OBJECT_FIELD: &str = "object";

/// Name of the metadata field.
pub const METADATA_FIELD: &str = "metadata";

/// Adds an optional `metadata` field holding a bounded string map.
///
/// # Errors
///
/// Returns [`SchemaError::NotAnObject`] if `schema` is not object-shaped.
pub fn with_metadata(schema: impl Into<Schema>) -> Result<Schema, SchemaError> {
    map_object(schema.into(), "with_metadata", |object| {
        object.optional(METADATA_FIELD, primitives::metadata())
    })
}

/// Requires `object == literal`, tagging decoded API objects by type name.
///
/// # Errors
///
/// Returns [`SchemaError::NotAnObject`] if `schema` is not object-shaped.
pub fn as_object_type(
    schema: impl Into<Schema>,
    literal: impl Into<String>,
) -> Result<Schema, SchemaError> {
    let literal = Value::String(literal.into());
    map_object(schema.into(), "as_object_type", |object| {
        object.required(OBJECT_FIELD, Schema::Literal(literal))
    })
}

/// Wraps `item` in the paginated list envelope.
///
/// The envelope is `{object: "list", has_more, url, data: [item],
/// total_count?, count?}`; every element of `data` is checked on its own.
#[must_use]
pub fn as_sublist(item: impl Into<Schema>) -> Schema {
    Schema::object()
        .required(OBJECT_FIELD, Schema::literal(rstripe_proto::LIST_OBJECT))
        .required("has_more", Schema::boolean())
        .required("url", Schema::string())
        .required("data", Schema::seq(item))
        .optional("total_count", Schema::int_range(Some(0), None))
        .optional("count", Schema::int_range(Some(0), None))
        .into()
}

/// Accepts either an immediate value conforming to `schema` or a pending handle.
///
/// Wrapping twice is the same as wrapping once.
#[must_use]
pub fn as_value_or_pending(schema: impl Into<Schema>) -> Schema {
    match schema.into() {
        wrapped @ Schema::ValueOrPending(_) => wrapped,
        other => Schema::ValueOrPending(Box::new(other)),
    }
}

/// Applies `f` to the object part of `schema`.
///
/// For a conjunction the first object member is extended, so constraints
/// on the other members are kept as they are.
fn map_object(
    schema: Schema,
    op: &'static str,
    f: impl FnOnce(ObjectSchema) -> ObjectSchema,
) -> Result<Schema, SchemaError> {
    match schema {
        Schema::Object(object) => Ok(Schema::Object(f(object))),
        Schema::AllOf(mut members) => {
            let Some(slot) = members
                .iter_mut()
                .find(|member| matches!(member, Schema::Object(_)))
            else {
                return Err(SchemaError::NotAnObject { op });
            };
            if let Schema::Object(object) = std::mem::replace(slot, Schema::Any) {
                *slot = Schema::Object(f(object));
            }
            Ok(Schema::AllOf(members))
        }
        _ => Err(SchemaError::NotAnObject { op }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Registry;
    use serde_json::json;

    fn registry() -> Registry {
        Registry::builder().build().unwrap()
    }

    #[test]
    fn test_with_metadata_rejects_non_object() {
        assert_eq!(
            with_metadata(Schema::string()),
            Err(SchemaError::NotAnObject {
                op: "with_metadata"
            })
        );
    }

    #[test]
    fn test_as_object_type_requires_literal() {
        let schema = as_object_type(Schema::object().required("id", Schema::string()), "account")
            .unwrap();
        let registry = registry();
        assert!(registry.validate_schema(&schema, &json!({"id": "acct_1", "object": "account"})));
        assert!(!registry.validate_schema(&schema, &json!({"id": "acct_1", "object": "charge"})));
        assert!(!registry.validate_schema(&schema, &json!({"id": "acct_1"})));
    }

    #[test]
    fn test_composition_is_non_destructive() {
        let base = Schema::object().required("id", Schema::string());
        let tagged = as_object_type(base, "customer").unwrap();
        let both = with_metadata(tagged.clone()).unwrap();

        let Schema::Object(object) = &both else {
            panic!("expected object");
        };
        assert!(object.field("id").unwrap().required);
        assert!(object.field("object").unwrap().required);
        assert!(!object.field("metadata").unwrap().required);

        let registry = registry();
        let value = json!({"id": "cus_1", "object": "customer", "metadata": {"k": 1}});
        assert!(registry.validate_schema(&tagged, &value));
        assert!(!registry.validate_schema(&both, &value));
    }

    #[test]
    fn test_composition_order_does_not_matter() {
        let base = || Schema::object().required("id", Schema::string());
        let a = with_metadata(as_object_type(base(), "refund").unwrap()).unwrap();
        let b = as_object_type(with_metadata(base()).unwrap(), "refund").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_compose_into_conjunction() {
        let schema = Schema::all_of([
            Schema::Map {
                values: Box::new(Schema::Any),
                max_entries: Some(50),
            },
            Schema::object().required("id", Schema::string()).into(),
        ]);
        let tagged = as_object_type(schema, "charge").unwrap();
        let registry = registry();
        assert!(registry.validate_schema(&tagged, &json!({"id": "ch_1", "object": "charge"})));
        assert!(!registry.validate_schema(&tagged, &json!({"id": "ch_1"})));
    }

    #[test]
    fn test_sublist_accepts_empty_final_page() {
        let schema = as_sublist(Schema::reference("id"));
        let registry = registry();
        assert!(registry.validate_schema(
            &schema,
            &json!({"object": "list", "has_more": false, "url": "/v1/charges", "data": []})
        ));
    }

    #[test]
    fn test_sublist_rejects_any_bad_element() {
        let item = as_object_type(Schema::object().required("id", Schema::string()), "charge")
            .unwrap();
        let schema = as_sublist(item);
        let registry = registry();
        let violations = registry.explain_schema(
            &schema,
            &json!({
                "object": "list",
                "has_more": true,
                "url": "/v1/charges",
                "data": [
                    {"id": "ch_1", "object": "charge"},
                    {"id": "ch_2", "object": "refund"},
                    {"id": "ch_3", "object": "charge"}
                ]
            }),
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "data/1/object");
    }

    #[test]
    fn test_value_or_pending_is_idempotent() {
        let once = as_value_or_pending(Schema::string());
        let twice = as_value_or_pending(once.clone());
        assert_eq!(once, twice);
    }
}
