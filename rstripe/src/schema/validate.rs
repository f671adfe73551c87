//! Schema checking.
//!
//! Checking walks the schema and the value together and records every
//! mismatch it finds instead of stopping at the first one.

use std::fmt::{self, Display, Formatter};
use std::ops::Deref;

use serde_json::{Map, Value};

use super::{Bounds, ObjectSchema, Registry, Schema};

/// Maximum reference nesting followed before giving up.
pub(crate) const MAX_DEPTH: usize = 64;

/// A single mismatch between a value and a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Slash-separated location inside the value (`data/0/id`); empty for the root.
    pub path: String,
    /// What went wrong.
    pub kind: ViolationKind,
}

/// Kinds of schema mismatch.
#[derive(Debug, Clone, PartialEq)]
pub enum ViolationKind {
    /// The value has the wrong JSON type.
    TypeMismatch {
        /// Expected JSON type.
        expected: &'static str,
        /// Actual JSON type.
        found: &'static str,
    },
    /// A required field is absent.
    MissingField,
    /// A string or array length is out of bounds.
    Length {
        /// Minimum length, if bounded.
        min: Option<usize>,
        /// Maximum length, if bounded.
        max: Option<usize>,
        /// Actual length.
        actual: usize,
    },
    /// An integer is out of range.
    OutOfRange {
        /// Minimum value, if bounded.
        min: Option<i64>,
        /// Maximum value, if bounded.
        max: Option<i64>,
        /// Actual value.
        actual: i128,
    },
    /// A string is not one of the allowed literals.
    NotInEnum {
        /// Allowed values.
        allowed: Vec<String>,
        /// Actual value.
        actual: String,
    },
    /// The value differs from a fixed literal.
    LiteralMismatch {
        /// Expected literal.
        expected: Value,
        /// Actual value.
        actual: Value,
    },
    /// A map has more entries than allowed.
    TooManyEntries {
        /// Maximum number of entries.
        max: usize,
        /// Actual number of entries.
        actual: usize,
    },
    /// None of the alternatives of a one-of matched.
    NoAlternativeMatched {
        /// Number of alternatives tried.
        alternatives: usize,
    },
    /// A pending handle was offered where only an immediate value is allowed.
    PendingNotAllowed,
    /// A reference names a schema the registry does not know.
    UnknownSchema(String),
    /// Reference nesting exceeded the depth limit.
    RecursionLimit,
    /// A path placeholder could not be filled.
    PathArgument(String),
}

impl Display for ViolationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { expected, found } => write!(f, "expected {expected}, found {found}"),
            Self::MissingField => f.write_str("required field is missing"),
            Self::Length { min, max, actual } => {
                write!(f, "length {actual} outside {}", range(min.as_ref(), max.as_ref()))
            }
            Self::OutOfRange { min, max, actual } => {
                write!(f, "value {actual} outside {}", range(min.as_ref(), max.as_ref()))
            }
            Self::NotInEnum { allowed, actual } => {
                write!(f, "`{actual}` is not one of [{}]", allowed.join(", "))
            }
            Self::LiteralMismatch { expected, actual } => {
                write!(f, "expected literal {expected}, found {actual}")
            }
            Self::TooManyEntries { max, actual } => {
                write!(f, "{actual} entries exceed the maximum of {max}")
            }
            Self::NoAlternativeMatched { alternatives } => {
                write!(f, "none of {alternatives} alternatives matched")
            }
            Self::PendingNotAllowed => f.write_str("a pending result is not allowed here"),
            Self::UnknownSchema(name) => write!(f, "unknown schema `{name}`"),
            Self::RecursionLimit => f.write_str("schema reference depth limit exceeded"),
            Self::PathArgument(reason) => write!(f, "invalid path argument: {reason}"),
        }
    }
}

fn range<T: Display>(min: Option<&T>, max: Option<&T>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("{min}..={max}"),
        (Some(min), None) => format!("{min}.."),
        (None, Some(max)) => format!("..={max}"),
        (None, None) => "..".to_owned(),
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "(root): {}", self.kind)
        } else {
            write!(f, "{}: {}", self.path, self.kind)
        }
    }
}

/// A list of violations, displayed `; `-separated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Violations(pub Vec<Violation>);

impl Deref for Violations {
    type Target = [Violation];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Violation>> for Violations {
    fn from(violations: Vec<Violation>) -> Self {
        Self(violations)
    }
}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Display for Violations {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Walks a schema and a value, collecting violations.
pub(crate) struct Checker<'r> {
    registry: &'r Registry,
    path: Vec<String>,
    out: Vec<Violation>,
    depth: usize,
}

impl<'r> Checker<'r> {
    pub(crate) const fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            path: Vec::new(),
            out: Vec::new(),
            depth: 0,
        }
    }

    pub(crate) fn finish(self) -> Vec<Violation> {
        self.out
    }

    fn fork(&self) -> Self {
        Self {
            registry: self.registry,
            path: self.path.clone(),
            out: Vec::new(),
            depth: self.depth,
        }
    }

    fn report(&mut self, kind: ViolationKind) {
        self.out.push(Violation {
            path: self.path.join("/"),
            kind,
        });
    }

    fn at<F: FnOnce(&mut Self)>(&mut self, segment: impl Into<String>, f: F) {
        self.path.push(segment.into());
        f(self);
        self.path.pop();
    }

    pub(crate) fn check(&mut self, schema: &Schema, value: &Value) {
        match schema {
            Schema::Any => {}
            Schema::String(bounds) => self.check_string(bounds, value),
            Schema::Boolean => {
                if !value.is_boolean() {
                    self.mismatch("boolean", value);
                }
            }
            Schema::Integer(bounds) => self.check_integer(bounds, value),
            Schema::Number => {
                if !value.is_number() {
                    self.mismatch("number", value);
                }
            }
            Schema::Enum(allowed) => match value.as_str() {
                Some(actual) if allowed.iter().any(|a| a == actual) => {}
                Some(actual) => self.report(ViolationKind::NotInEnum {
                    allowed: allowed.clone(),
                    actual: actual.to_owned(),
                }),
                None => self.mismatch("string", value),
            },
            Schema::Literal(expected) => {
                if expected != value {
                    self.report(ViolationKind::LiteralMismatch {
                        expected: expected.clone(),
                        actual: value.clone(),
                    });
                }
            }
            Schema::Object(object) => match value.as_object() {
                Some(map) => self.check_object(object, map),
                None => self.mismatch("object", value),
            },
            Schema::Map {
                values,
                max_entries,
            } => self.check_map(values, *max_entries, value),
            Schema::Seq { items, max_len } => self.check_seq(items, *max_len, value),
            Schema::Nullable(inner) => {
                if !value.is_null() {
                    self.check(inner, value);
                }
            }
            Schema::OneOf(alternatives) => {
                let matched = alternatives.iter().any(|alternative| {
                    let mut fork = self.fork();
                    fork.check(alternative, value);
                    fork.out.is_empty()
                });
                if !matched {
                    self.report(ViolationKind::NoAlternativeMatched {
                        alternatives: alternatives.len(),
                    });
                }
            }
            Schema::AllOf(members) => {
                for member in members {
                    self.check(member, value);
                }
            }
            Schema::Ref(name) => self.check_ref(name, value),
            Schema::ValueOrPending(inner) => self.check(inner, value),
        }
    }

    pub(crate) fn check_object(&mut self, object: &ObjectSchema, map: &Map<String, Value>) {
        for (name, field) in object.fields() {
            match map.get(name) {
                Some(value) => self.at(name, |c| c.check(&field.schema, value)),
                None if field.required => self.at(name, |c| c.report(ViolationKind::MissingField)),
                None => {}
            }
        }
    }

    fn check_ref(&mut self, name: &str, value: &Value) {
        if self.depth >= MAX_DEPTH {
            self.report(ViolationKind::RecursionLimit);
            return;
        }
        let Some(schema) = self.registry.get(name) else {
            self.report(ViolationKind::UnknownSchema(name.to_owned()));
            return;
        };
        self.depth += 1;
        self.check(schema, value);
        self.depth -= 1;
    }

    fn check_string(&mut self, bounds: &Bounds<usize>, value: &Value) {
        let Some(s) = value.as_str() else {
            self.mismatch("string", value);
            return;
        };
        let actual = s.chars().count();
        if !bounds.contains(actual) {
            self.report(ViolationKind::Length {
                min: bounds.min,
                max: bounds.max,
                actual,
            });
        }
    }

    fn check_integer(&mut self, bounds: &Bounds<i64>, value: &Value) {
        let actual = value
            .as_i64()
            .map(i128::from)
            .or_else(|| value.as_u64().map(i128::from));
        let Some(actual) = actual else {
            self.mismatch("integer", value);
            return;
        };
        let below = bounds.min.is_some_and(|min| actual < i128::from(min));
        let above = bounds.max.is_some_and(|max| actual > i128::from(max));
        if below || above {
            self.report(ViolationKind::OutOfRange {
                min: bounds.min,
                max: bounds.max,
                actual,
            });
        }
    }

    fn check_map(&mut self, values: &Schema, max_entries: Option<usize>, value: &Value) {
        let Some(map) = value.as_object() else {
            self.mismatch("object", value);
            return;
        };
        if let Some(max) = max_entries
            && map.len() > max
        {
            self.report(ViolationKind::TooManyEntries {
                max,
                actual: map.len(),
            });
        }
        for (key, entry) in map {
            self.at(key, |c| c.check(values, entry));
        }
    }

    fn check_seq(&mut self, items: &Schema, max_len: Option<usize>, value: &Value) {
        let Some(array) = value.as_array() else {
            self.mismatch("array", value);
            return;
        };
        if let Some(max) = max_len
            && array.len() > max
        {
            self.report(ViolationKind::Length {
                min: None,
                max: Some(max),
                actual: array.len(),
            });
        }
        for (index, element) in array.iter().enumerate() {
            self.at(index.to_string(), |c| c.check(items, element));
        }
    }

    fn mismatch(&mut self, expected: &'static str, value: &Value) {
        self.report(ViolationKind::TypeMismatch {
            expected,
            found: type_name(value),
        });
    }
}
