//! Named schema registry.
//!
//! [`RegistryBuilder`] collects definitions at startup and rejects malformed
//! ones. [`RegistryBuilder::build`] resolves every reference and freezes the
//! result into a [`Registry`], which is immutable and cheap to clone: all
//! clones share one map, so concurrent readers need no locking.

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use serde_json::Value;
#[cfg(feature = "telemetry")]
use tracing::debug;

use super::validate::Checker;
use super::{Candidate, ObjectSchema, Schema, Violation, ViolationKind, primitives};
use crate::error::SchemaError;

/// Collects schema definitions before the registry is frozen.
#[derive(Default)]
pub struct RegistryBuilder {
    schemas: HashMap<String, Schema>,
}

impl Debug for RegistryBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_tuple("RegistryBuilder").field(&names).finish()
    }
}

impl RegistryBuilder {
    /// Creates a builder with no definitions, not even the primitives.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registers `schema` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateName`] if `name` is taken, or the
    /// construction error found by [`Schema::check_well_formed`].
    pub fn define(
        &mut self,
        name: impl Into<String>,
        schema: impl Into<Schema>,
    ) -> Result<&mut Self, SchemaError> {
        let name = name.into();
        let schema = schema.into();
        if self.schemas.contains_key(&name) {
            return Err(SchemaError::DuplicateName(name));
        }
        schema
            .check_well_formed()
            .map_err(|source| SchemaError::Definition {
                name: name.clone(),
                source: Box::new(source),
            })?;
        self.schemas.insert(name, schema);
        Ok(self)
    }

    /// Returns `true` if `name` has been defined.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Resolves references and freezes the registry.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnresolvedReference`] if a definition refers
    /// to an undefined name, or [`SchemaError::ReferenceCycle`] if a chain
    /// of bare references loops back on itself.
    pub fn build(self) -> Result<Registry, SchemaError> {
        for (name, schema) in &self.schemas {
            let mut refs = Vec::new();
            schema.collect_refs(&mut refs);
            if let Some(missing) = refs.into_iter().find(|r| !self.schemas.contains_key(*r)) {
                return Err(SchemaError::UnresolvedReference {
                    schema: name.clone(),
                    reference: missing.to_owned(),
                });
            }
            self.check_alias_chain(name)?;
        }

        #[cfg(feature = "telemetry")]
        debug!(schemas = self.schemas.len(), "schema registry built");

        Ok(Registry {
            schemas: Arc::new(self.schemas),
        })
    }

    /// Follows `name` through bare references, failing on a loop.
    fn check_alias_chain(&self, name: &str) -> Result<(), SchemaError> {
        let mut seen = HashSet::new();
        let mut current = name;
        while let Some(Schema::Ref(next)) = self.schemas.get(current) {
            if !seen.insert(current) {
                return Err(SchemaError::ReferenceCycle(name.to_owned()));
            }
            current = next;
        }
        Ok(())
    }
}

/// Immutable map from schema name to [`Schema`].
#[derive(Clone)]
pub struct Registry {
    schemas: Arc<HashMap<String, Schema>>,
}

impl Debug for Registry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_tuple("Registry").field(&names).finish()
    }
}

impl Registry {
    /// Starts a registry pre-populated with the shared [`primitives`].
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        let mut builder = RegistryBuilder::empty();
        for (name, schema) in primitives::all() {
            builder.schemas.insert(name.to_owned(), schema);
        }
        builder
    }

    /// Returns the schema registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Returns `true` if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Iterates over registered names in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Returns `true` if `value` conforms to the schema named `name`.
    ///
    /// An unknown name never validates.
    #[must_use]
    pub fn validate(&self, name: &str, value: &Value) -> bool {
        self.explain(name, value).is_empty()
    }

    /// Lists every way `value` fails the schema named `name`.
    #[must_use]
    pub fn explain(&self, name: &str, value: &Value) -> Vec<Violation> {
        self.explain_schema(&Schema::reference(name), value)
    }

    /// Returns `true` if `value` conforms to an anonymous `schema`.
    #[must_use]
    pub fn validate_schema(&self, schema: &Schema, value: &Value) -> bool {
        self.explain_schema(schema, value).is_empty()
    }

    /// Lists every way `value` fails an anonymous `schema`.
    ///
    /// References inside `schema` resolve against this registry.
    #[must_use]
    pub fn explain_schema(&self, schema: &Schema, value: &Value) -> Vec<Violation> {
        let mut checker = Checker::new(self);
        checker.check(schema, value);
        checker.finish()
    }

    /// Lists every way a parameter map fails an object schema.
    #[must_use]
    pub fn explain_params(
        &self,
        schema: &ObjectSchema,
        params: &serde_json::Map<String, Value>,
    ) -> Vec<Violation> {
        let mut checker = Checker::new(self);
        checker.check_object(schema, params);
        checker.finish()
    }

    /// Checks an immediate value or a pending handle against `name`.
    ///
    /// A pending handle only conforms to a value-or-pending schema.
    #[must_use]
    pub fn explain_candidate(&self, name: &str, candidate: Candidate<'_>) -> Vec<Violation> {
        match candidate {
            Candidate::Value(value) => self.explain(name, value),
            Candidate::Pending => {
                let kind = if !self.contains(name) {
                    ViolationKind::UnknownSchema(name.to_owned())
                } else if Schema::reference(name).accepts_pending(self) {
                    return Vec::new();
                } else {
                    ViolationKind::PendingNotAllowed
                };
                vec![Violation {
                    path: String::new(),
                    kind,
                }]
            }
        }
    }

    /// Returns `true` if the candidate conforms to `name`.
    #[must_use]
    pub fn validate_candidate(&self, name: &str, candidate: Candidate<'_>) -> bool {
        self.explain_candidate(name, candidate).is_empty()
    }
}
