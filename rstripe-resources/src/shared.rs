//! Shapes shared by several resources.

use rstripe::schema::{ObjectSchema, primitives};
use rstripe::{RegistryBuilder, Schema, SchemaError};

/// Postal address.
pub const ADDRESS: &str = "address";

/// Payment card attached to a charge or customer.
pub const CARD: &str = "card";

/// Largest page the list endpoints return.
pub const MAX_PAGE_SIZE: i64 = 100;

pub(crate) fn define(builder: &mut RegistryBuilder) -> Result<(), SchemaError> {
    builder.define(ADDRESS, address())?.define(CARD, card()?)?;
    Ok(())
}

fn nullable_string() -> Schema {
    Schema::nullable(Schema::string())
}

fn address() -> Schema {
    Schema::object()
        .optional("line1", nullable_string())
        .optional("line2", nullable_string())
        .optional("city", nullable_string())
        .optional("state", nullable_string())
        .optional("postal_code", nullable_string())
        .optional("country", Schema::nullable(Schema::reference(primitives::COUNTRY)))
        .into()
}

fn card() -> Result<Schema, SchemaError> {
    rstripe::schema::as_object_type(
        Schema::object()
            .required("id", Schema::reference(primitives::ID))
            .required("last4", Schema::reference(primitives::LAST4))
            .optional("brand", Schema::string())
            .optional("exp_month", Schema::int_range(Some(1), Some(12)))
            .optional("exp_year", Schema::int_range(Some(0), None))
            .optional("country", Schema::nullable(Schema::reference(primitives::COUNTRY)))
            .optional(
                "funding",
                Schema::enumeration(["credit", "debit", "prepaid", "unknown"]),
            ),
        "card",
    )
}

/// Bounds on a timestamp: a bare timestamp or any of `gt`, `gte`, `lt`, `lte`.
pub(crate) fn timestamp_filter() -> Schema {
    let timestamp = || Schema::reference(primitives::UNIX_TIMESTAMP);
    Schema::one_of([
        timestamp(),
        Schema::object()
            .optional("gt", timestamp())
            .optional("gte", timestamp())
            .optional("lt", timestamp())
            .optional("lte", timestamp())
            .into(),
    ])
}

/// Cursor pagination accepted by every list endpoint.
pub(crate) fn list_params() -> ObjectSchema {
    Schema::object()
        .optional("limit", Schema::int_range(Some(1), Some(MAX_PAGE_SIZE)))
        .optional("starting_after", Schema::reference(primitives::ID))
        .optional("ending_before", Schema::reference(primitives::ID))
        .optional("created", timestamp_filter())
        .merge(expand_params())
}

/// Related objects to inline in the response.
pub(crate) fn expand_params() -> ObjectSchema {
    Schema::object().optional("expand", Schema::seq(Schema::string()))
}

/// A related object: its id, or the object itself once expanded.
pub(crate) fn expandable(object: &str) -> Schema {
    Schema::one_of([Schema::reference(primitives::ID), Schema::reference(object)])
}

#[cfg(test)]
mod tests {
    use crate::registry;
    use serde_json::json;

    #[test]
    fn test_address_fields_are_nullable() {
        assert!(registry().validate(
            super::ADDRESS,
            &json!({"line1": "1 Main St", "line2": null, "country": "US"})
        ));
        assert!(!registry().validate(super::ADDRESS, &json!({"country": "USA"})));
    }

    #[test]
    fn test_card_requires_tag_and_last4() {
        let card = json!({"id": "card_1", "object": "card", "last4": "4242", "exp_month": 12});
        assert!(registry().validate(super::CARD, &card));
        assert!(!registry().validate(super::CARD, &json!({"id": "card_1", "object": "card", "last4": "42"})));
        assert!(!registry().validate(
            super::CARD,
            &json!({"id": "card_1", "object": "card", "last4": "4242", "exp_month": 13})
        ));
    }

    #[test]
    fn test_expandable_accepts_id_or_object() {
        let registry = registry();
        let field = super::expandable(super::CARD);
        assert!(registry.validate_schema(&field, &json!("card_1")));
        assert!(registry.validate_schema(
            &field,
            &json!({"id": "card_1", "object": "card", "last4": "4242"})
        ));
        assert!(!registry.validate_schema(&field, &json!({"id": "card_1", "object": "card"})));
        assert!(!registry.validate_schema(&field, &json!(7)));
    }

    #[test]
    fn test_timestamp_filter() {
        let registry = registry();
        let filter = super::timestamp_filter();
        assert!(registry.validate_schema(&filter, &json!(1_700_000_000)));
        assert!(registry.validate_schema(&filter, &json!({"gte": 1, "lt": 2})));
        assert!(!registry.validate_schema(&filter, &json!({"gte": -1})));
        assert!(!registry.validate_schema(&filter, &json!("yesterday")));
    }
}
