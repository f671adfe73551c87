//! Declarative value shapes and the schema registry.
//!
//! A [`Schema`] is a plain value describing the shape of a JSON document.
//! Schemas are checked with [`Registry::validate`] / [`Registry::explain`],
//! which never fail: they answer with a boolean or a list of [`Violation`]s.
//!
//! # Building blocks
//!
//! - Primitives: [`Schema::string`], [`Schema::integer`], [`Schema::enumeration`],
//!   [`Schema::int_range`], [`Schema::fixed_len`], [`Schema::literal`], ...
//! - Composites: [`ObjectSchema`], [`Schema::map_of`], [`Schema::seq`],
//!   [`Schema::one_of`], [`Schema::reference`]
//! - Composition operators in [`compose`]: [`with_metadata`], [`as_object_type`],
//!   [`as_sublist`], [`as_value_or_pending`]
//! - Named primitives shared by every resource in [`primitives`]
//!
//! Composition never mutates its input: every operator returns a new
//! schema that carries all constraints of the old one plus its own.

pub mod compose;
pub mod primitives;
mod registry;
mod validate;

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::SchemaError;
use crate::pending::PendingResult;

pub use compose::{as_object_type, as_sublist, as_value_or_pending, with_metadata};
pub use registry::{Registry, RegistryBuilder};
pub use validate::{Violation, ViolationKind, Violations};

/// A composable predicate over a JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// Accepts any value.
    Any,
    /// A string, optionally bounded in length (counted in characters).
    String(Bounds<usize>),
    /// `true` or `false`.
    Boolean,
    /// An integer, optionally bounded (inclusive).
    Integer(Bounds<i64>),
    /// Any JSON number.
    Number,
    /// One of a fixed set of string literals.
    Enum(Vec<String>),
    /// Exactly this value.
    Literal(Value),
    /// An object with declared fields. Undeclared fields are allowed.
    Object(ObjectSchema),
    /// An object used as a map: every value satisfies `values`.
    Map {
        /// Schema every entry value must satisfy.
        values: Box<Schema>,
        /// Maximum number of entries (inclusive).
        max_entries: Option<usize>,
    },
    /// An array whose every element satisfies `items`.
    Seq {
        /// Schema every element must satisfy.
        items: Box<Schema>,
        /// Maximum number of elements (inclusive).
        max_len: Option<usize>,
    },
    /// `null` or the wrapped schema.
    Nullable(Box<Schema>),
    /// At least one alternative matches.
    OneOf(Vec<Schema>),
    /// Every member matches.
    AllOf(Vec<Schema>),
    /// The schema registered under this name.
    Ref(String),
    /// An immediate value conforming to the inner schema, or a pending handle.
    ///
    /// The inner schema documents the eventual value; a pending handle is
    /// accepted without any check of what it will resolve to.
    ValueOrPending(Box<Schema>),
}

/// Inclusive lower/upper bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds<T> {
    /// Smallest accepted value.
    pub min: Option<T>,
    /// Largest accepted value.
    pub max: Option<T>,
}

impl<T: Copy + PartialOrd> Bounds<T> {
    /// No bounds at all.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            min: None,
            max: None,
        }
    }

    /// Returns `true` if `value` lies within the bounds.
    pub fn contains(&self, value: T) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }

    fn inverted(&self) -> bool {
        matches!((self.min, self.max), (Some(min), Some(max)) if min > max)
    }
}

/// A declared object field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Shape of the field value.
    pub schema: Schema,
    /// Whether the field must be present.
    pub required: bool,
}

/// An object with required and optional fields.
///
/// Fields are kept sorted by name so violation lists are deterministic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectSchema {
    fields: BTreeMap<String, Field>,
}

impl ObjectSchema {
    /// Creates an object schema with no declared fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a required field.
    #[must_use]
    pub fn required(self, name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.with_field(name, schema, true)
    }

    /// Declares an optional field.
    #[must_use]
    pub fn optional(self, name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.with_field(name, schema, false)
    }

    /// Declares a field, conjoining with any existing declaration of the same name.
    ///
    /// A field that is required on either side stays required.
    #[must_use]
    pub fn with_field(
        mut self,
        name: impl Into<String>,
        schema: impl Into<Schema>,
        required: bool,
    ) -> Self {
        let schema = schema.into();
        let name = name.into();
        let field = match self.fields.remove(&name) {
            Some(existing) => Field {
                schema: Schema::all_of([existing.schema, schema]),
                required: existing.required || required,
            },
            None => Field { schema, required },
        };
        self.fields.insert(name, field);
        self
    }

    /// Merges every field of `other` into `self`.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        other
            .fields
            .into_iter()
            .fold(self, |acc, (name, field)| {
                acc.with_field(name, field.schema, field.required)
            })
    }

    /// Returns the declaration of `name`, if any.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Iterates over declared fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Names of the required fields.
    pub fn required_names(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, f)| f.required)
            .map(|(k, _)| k.as_str())
    }
}

impl From<ObjectSchema> for Schema {
    fn from(object: ObjectSchema) -> Self {
        Self::Object(object)
    }
}

impl Schema {
    /// Any string.
    #[must_use]
    pub const fn string() -> Self {
        Self::String(Bounds::unbounded())
    }

    /// A string whose character count lies within `min..=max`.
    #[must_use]
    pub const fn string_len(min: Option<usize>, max: Option<usize>) -> Self {
        Self::String(Bounds { min, max })
    }

    /// A string of exactly `len` characters.
    #[must_use]
    pub const fn fixed_len(len: usize) -> Self {
        Self::string_len(Some(len), Some(len))
    }

    /// A string of at most `max` characters.
    #[must_use]
    pub const fn max_len(max: usize) -> Self {
        Self::string_len(None, Some(max))
    }

    /// `true` or `false`.
    #[must_use]
    pub const fn boolean() -> Self {
        Self::Boolean
    }

    /// Any integer.
    #[must_use]
    pub const fn integer() -> Self {
        Self::Integer(Bounds::unbounded())
    }

    /// An integer within `min..=max`.
    #[must_use]
    pub const fn int_range(min: Option<i64>, max: Option<i64>) -> Self {
        Self::Integer(Bounds { min, max })
    }

    /// Any JSON number.
    #[must_use]
    pub const fn number() -> Self {
        Self::Number
    }

    /// One of the given string literals.
    #[must_use]
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum(values.into_iter().map(Into::into).collect())
    }

    /// Exactly `value`.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Starts an object schema.
    #[must_use]
    pub fn object() -> ObjectSchema {
        ObjectSchema::new()
    }

    /// A string-keyed map whose values satisfy `values`.
    #[must_use]
    pub fn map_of(values: impl Into<Self>, max_entries: Option<usize>) -> Self {
        Self::Map {
            values: Box::new(values.into()),
            max_entries,
        }
    }

    /// An array of `items`.
    #[must_use]
    pub fn seq(items: impl Into<Self>) -> Self {
        Self::Seq {
            items: Box::new(items.into()),
            max_len: None,
        }
    }

    /// An array of at most `max_len` `items`.
    #[must_use]
    pub fn bounded_seq(items: impl Into<Self>, max_len: usize) -> Self {
        Self::Seq {
            items: Box::new(items.into()),
            max_len: Some(max_len),
        }
    }

    /// `null` or `inner`.
    #[must_use]
    pub fn nullable(inner: impl Into<Self>) -> Self {
        Self::Nullable(Box::new(inner.into()))
    }

    /// At least one of `alternatives`.
    #[must_use]
    pub fn one_of(alternatives: impl IntoIterator<Item = Self>) -> Self {
        Self::OneOf(alternatives.into_iter().collect())
    }

    /// Every one of `members`, flattening nested conjunctions.
    #[must_use]
    pub fn all_of(members: impl IntoIterator<Item = Self>) -> Self {
        let mut flat = Vec::new();
        for member in members {
            match member {
                Self::AllOf(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Self::AllOf(flat)
        }
    }

    /// The schema registered under `name`.
    #[must_use]
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Ref(name.into())
    }

    /// Returns `true` if a pending handle satisfies this schema.
    ///
    /// Only [`Schema::ValueOrPending`] (possibly behind references) does.
    #[must_use]
    pub fn accepts_pending(&self, registry: &Registry) -> bool {
        let mut current = self;
        for _ in 0..validate::MAX_DEPTH {
            match current {
                Self::ValueOrPending(_) => return true,
                Self::Ref(name) => match registry.get(name) {
                    Some(next) => current = next,
                    None => return false,
                },
                _ => return false,
            }
        }
        false
    }

    /// Checks the schema for construction errors.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] for empty enumerations, empty alternative
    /// lists and inverted bounds anywhere inside the schema.
    pub fn check_well_formed(&self) -> Result<(), SchemaError> {
        match self {
            Self::Any | Self::Boolean | Self::Number | Self::Literal(_) | Self::Ref(_) => Ok(()),
            Self::String(bounds) => {
                if bounds.inverted() {
                    return Err(SchemaError::InvertedBounds(format!("{bounds:?}")));
                }
                Ok(())
            }
            Self::Integer(bounds) => {
                if bounds.inverted() {
                    return Err(SchemaError::InvertedBounds(format!("{bounds:?}")));
                }
                Ok(())
            }
            Self::Enum(values) => {
                if values.is_empty() {
                    return Err(SchemaError::EmptyEnum);
                }
                Ok(())
            }
            Self::Object(object) => object
                .fields
                .values()
                .try_for_each(|field| field.schema.check_well_formed()),
            Self::Map { values, .. } => values.check_well_formed(),
            Self::Seq { items, .. } => items.check_well_formed(),
            Self::Nullable(inner) | Self::ValueOrPending(inner) => inner.check_well_formed(),
            Self::OneOf(members) | Self::AllOf(members) => {
                if members.is_empty() {
                    return Err(SchemaError::EmptyAlternatives);
                }
                members.iter().try_for_each(Self::check_well_formed)
            }
        }
    }

    /// Collects every name this schema refers to.
    pub(crate) fn collect_refs<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Ref(name) => out.push(name),
            Self::Object(object) => {
                for field in object.fields.values() {
                    field.schema.collect_refs(out);
                }
            }
            Self::Map { values: inner, .. }
            | Self::Seq { items: inner, .. }
            | Self::Nullable(inner)
            | Self::ValueOrPending(inner) => inner.collect_refs(out),
            Self::OneOf(members) | Self::AllOf(members) => {
                for member in members {
                    member.collect_refs(out);
                }
            }
            _ => {}
        }
    }
}

/// Something a schema can be checked against: an immediate value or a
/// pending handle.
#[derive(Debug, Clone, Copy)]
pub enum Candidate<'a> {
    /// An immediate JSON value.
    Value(&'a Value),
    /// A result that has not been delivered yet.
    Pending,
}

impl<'a> From<&'a Value> for Candidate<'a> {
    fn from(value: &'a Value) -> Self {
        Self::Value(value)
    }
}

impl<T> From<&PendingResult<T>> for Candidate<'_> {
    fn from(_: &PendingResult<T>) -> Self {
        Self::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_with_field_conjoins_existing_declaration() {
        let object = Schema::object()
            .optional("email", Schema::string())
            .required("email", Schema::max_len(5));
        let field = object.field("email").unwrap();
        assert!(field.required);
        assert_eq!(
            field.schema,
            Schema::AllOf(vec![Schema::string(), Schema::max_len(5)])
        );
    }

    #[test]
    fn test_all_of_flattens_and_unwraps_single() {
        let nested = Schema::all_of([
            Schema::all_of([Schema::string(), Schema::max_len(3)]),
            Schema::fixed_len(2),
        ]);
        assert_eq!(
            nested,
            Schema::AllOf(vec![Schema::string(), Schema::max_len(3), Schema::fixed_len(2)])
        );
        assert_eq!(Schema::all_of([Schema::Boolean]), Schema::Boolean);
    }

    #[test]
    fn test_check_well_formed_rejects_empty_enum() {
        let schema: Schema = Schema::object()
            .required("kind", Schema::enumeration(Vec::<String>::new()))
            .into();
        assert_eq!(schema.check_well_formed(), Err(SchemaError::EmptyEnum));
    }

    #[test]
    fn test_check_well_formed_rejects_inverted_range() {
        let schema = Schema::int_range(Some(10), Some(1));
        assert!(matches!(
            schema.check_well_formed(),
            Err(SchemaError::InvertedBounds(_))
        ));
    }

    #[test]
    fn test_collect_refs_walks_nested_shapes() {
        let schema: Schema = Schema::object()
            .required("currency", Schema::reference("currency"))
            .optional(
                "items",
                Schema::seq(Schema::nullable(Schema::reference("item"))),
            )
            .into();
        let mut refs = Vec::new();
        schema.collect_refs(&mut refs);
        refs.sort_unstable();
        assert_eq!(refs, vec!["currency", "item"]);
    }

    #[test]
    fn test_literal_from_json() {
        assert_eq!(Schema::literal(json!("list")), Schema::literal("list"));
    }
}
