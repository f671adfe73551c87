//! Operation descriptors.
//!
//! An [`Operation`] describes one remote endpoint: HTTP method, path
//! template, the parameters it requires and accepts, and the registry name
//! of its result. Descriptors are built once at startup and never change.

use std::fmt::{self, Display, Formatter};

use rstripe_proto::Params;
use url::form_urlencoded;

use crate::error::ValidationError;
use crate::schema::{ObjectSchema, Registry, Schema, Violation, ViolationKind};

/// HTTP methods used by the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read; parameters go in the query string.
    Get,
    /// Create or update; parameters go in a form-encoded body.
    Post,
    /// Delete; parameters go in the query string.
    Delete,
}

impl Method {
    /// Upper-case method name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }

    /// Returns `true` if parameters travel in the request body.
    #[must_use]
    pub const fn has_body(&self) -> bool {
        matches!(self, Self::Post)
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor of one remote endpoint.
///
/// # Example
///
/// ```rust
/// use rstripe::{Method, Operation, Schema};
///
/// let retrieve = Operation::new("charges.retrieve", Method::Get, "/v1/charges/{id}")
///     .accept("expand", Schema::seq(Schema::string()))
///     .returns("charge");
/// assert_eq!(retrieve.path(&["ch_1"]).unwrap(), "/v1/charges/ch_1");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    name: &'static str,
    method: Method,
    path: &'static str,
    required: ObjectSchema,
    optional: ObjectSchema,
    result: Option<&'static str>,
}

impl Operation {
    /// Creates a descriptor with no declared parameters and no result schema.
    #[must_use]
    pub fn new(name: &'static str, method: Method, path: &'static str) -> Self {
        Self {
            name,
            method,
            path,
            required: ObjectSchema::new(),
            optional: ObjectSchema::new(),
            result: None,
        }
    }

    /// Declares a required parameter.
    #[must_use]
    pub fn require(mut self, field: &'static str, schema: impl Into<Schema>) -> Self {
        self.required = self.required.required(field, schema);
        self
    }

    /// Declares an optional parameter.
    #[must_use]
    pub fn accept(mut self, field: &'static str, schema: impl Into<Schema>) -> Self {
        self.optional = self.optional.optional(field, schema);
        self
    }

    /// Declares every field of `object` as an optional parameter.
    #[must_use]
    pub fn accept_all(mut self, object: ObjectSchema) -> Self {
        for (name, field) in object.fields() {
            self.optional = self.optional.optional(name, field.schema.clone());
        }
        self
    }

    /// Names the registry schema the decoded result must satisfy.
    #[must_use]
    pub const fn returns(mut self, schema: &'static str) -> Self {
        self.result = Some(schema);
        self
    }

    /// Operation name, e.g. `accounts.create`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Path template with `{placeholder}`s.
    #[must_use]
    pub const fn path_template(&self) -> &'static str {
        self.path
    }

    /// Registry name of the result schema.
    #[must_use]
    pub const fn result(&self) -> Option<&'static str> {
        self.result
    }

    /// Required parameters.
    #[must_use]
    pub const fn required(&self) -> &ObjectSchema {
        &self.required
    }

    /// Optional parameters.
    #[must_use]
    pub const fn optional(&self) -> &ObjectSchema {
        &self.optional
    }

    /// Required and optional parameters as one object schema.
    #[must_use]
    pub fn param_schema(&self) -> ObjectSchema {
        self.required.clone().merge(self.optional.clone())
    }

    /// Fills the path template with `args`, in order.
    ///
    /// Each argument is percent-encoded so ids can never add path segments.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the number of arguments does not match
    /// the number of placeholders, or an argument is empty.
    pub fn path(&self, args: &[&str]) -> Result<String, ValidationError> {
        let mut out = String::with_capacity(self.path.len() + 16);
        let mut rest = self.path;
        let mut args = args.iter();
        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}').map(|i| open + i) else {
                break;
            };
            let placeholder = &rest[open + 1..close];
            let arg = args
                .next()
                .ok_or_else(|| self.path_error(placeholder, "missing"))?;
            if arg.is_empty() {
                return Err(self.path_error(placeholder, "empty"));
            }
            out.push_str(&rest[..open]);
            // Form encoding writes a space as `+`, which a path reads literally.
            out.extend(
                form_urlencoded::byte_serialize(arg.as_bytes())
                    .map(|chunk| if chunk == "+" { "%20" } else { chunk }),
            );
            rest = &rest[close + 1..];
        }
        if args.next().is_some() {
            return Err(self.path_error("", "too many arguments"));
        }
        out.push_str(rest);
        Ok(out)
    }

    /// Checks `params` against the declared parameters.
    ///
    /// Undeclared parameters are passed through untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] listing every violation.
    pub fn validate_params(&self, registry: &Registry, params: &Params) -> Result<(), ValidationError> {
        let violations = registry.explain_params(&self.param_schema(), params);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                operation: self.name.to_owned(),
                violations: violations.into(),
            })
        }
    }

    fn path_error(&self, placeholder: &str, reason: &str) -> ValidationError {
        ValidationError {
            operation: self.name.to_owned(),
            violations: vec![Violation {
                path: placeholder.to_owned(),
                kind: ViolationKind::PathArgument(reason.to_owned()),
            }]
            .into(),
        }
    }
}
