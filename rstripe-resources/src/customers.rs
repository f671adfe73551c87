//! Customers.

use std::sync::LazyLock;

use rstripe::schema::{
    ObjectSchema, as_object_type, as_sublist, as_value_or_pending, primitives, with_metadata,
};
use rstripe::{
    Error, Method, Operation, PendingResult, RegistryBuilder, RequestOptions, Schema, SchemaError,
};
use rstripe_http::Client;

use crate::shared;

/// Customer object.
pub const CUSTOMER: &str = "customer";
/// Page of customers.
pub const CUSTOMER_LIST: &str = "customer_list";
/// Customer object or the pending result of a call producing one.
pub const CUSTOMER_RESULT: &str = "customer_result";

pub(crate) fn define(builder: &mut RegistryBuilder) -> Result<(), SchemaError> {
    builder
        .define(CUSTOMER, customer()?)?
        .define(CUSTOMER_LIST, as_sublist(Schema::reference(CUSTOMER)))?
        .define(
            CUSTOMER_RESULT,
            as_value_or_pending(Schema::reference(CUSTOMER)),
        )?;
    Ok(())
}

fn customer() -> Result<Schema, SchemaError> {
    let nullable_string = || Schema::nullable(Schema::string());
    with_metadata(as_object_type(
        Schema::object()
            .required("id", Schema::reference(primitives::ID))
            .optional("email", nullable_string())
            .optional("name", nullable_string())
            .optional("description", nullable_string())
            .optional("phone", nullable_string())
            .optional("balance", Schema::integer())
            .optional(
                "currency",
                Schema::nullable(Schema::reference(primitives::CURRENCY)),
            )
            .optional("delinquent", Schema::nullable(Schema::boolean()))
            .optional("livemode", Schema::boolean())
            .optional(
                "default_source",
                Schema::nullable(shared::expandable(shared::CARD)),
            )
            .optional("address", Schema::nullable(Schema::reference(shared::ADDRESS)))
            .optional("created", Schema::reference(primitives::UNIX_TIMESTAMP)),
        "customer",
    )?)
}

/// Parameters accepted by both create and update.
fn writable_params() -> ObjectSchema {
    Schema::object()
        .optional("email", Schema::string())
        .optional("name", Schema::string())
        .optional("description", Schema::string())
        .optional("phone", Schema::string())
        .optional("balance", Schema::integer())
        .optional("source", Schema::reference(primitives::ID))
        .optional("address", Schema::reference(shared::ADDRESS))
        .optional("metadata", Schema::reference(primitives::METADATA))
}

static CREATE: LazyLock<Operation> = LazyLock::new(|| {
    Operation::new("customers.create", Method::Post, "/v1/customers")
        .accept_all(writable_params())
        .returns(CUSTOMER)
});

static RETRIEVE: LazyLock<Operation> = LazyLock::new(|| {
    Operation::new("customers.retrieve", Method::Get, "/v1/customers/{id}")
        .accept_all(shared::expand_params())
        .returns(CUSTOMER)
});

static UPDATE: LazyLock<Operation> = LazyLock::new(|| {
    Operation::new("customers.update", Method::Post, "/v1/customers/{id}")
        .accept_all(writable_params())
        .returns(CUSTOMER)
});

static DELETE: LazyLock<Operation> = LazyLock::new(|| {
    Operation::new("customers.delete", Method::Delete, "/v1/customers/{id}")
        .returns(primitives::DELETED)
});

static LIST: LazyLock<Operation> = LazyLock::new(|| {
    Operation::new("customers.list", Method::Get, "/v1/customers")
        .accept("email", Schema::string())
        .accept_all(shared::list_params())
        .returns(CUSTOMER_LIST)
});

/// Every customer operation.
#[must_use]
pub fn operations() -> [&'static Operation; 5] {
    [&*CREATE, &*RETRIEVE, &*UPDATE, &*DELETE, &*LIST]
}

/// Customer operations, borrowed from a [`Stripe`](crate::Stripe) handle.
#[derive(Debug, Clone, Copy)]
pub struct Customers<'a> {
    client: &'a Client,
}

#[allow(clippy::needless_pass_by_value)]
impl<'a> Customers<'a> {
    /// Wraps `client`.
    #[must_use]
    pub const fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// `POST /v1/customers`.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if a parameter is invalid or the request cannot be built.
    pub fn create(&self, options: RequestOptions) -> Result<PendingResult, Error> {
        self.client.execute(&CREATE, &[], options)
    }

    /// `GET /v1/customers/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if `id` is empty or the request cannot be built.
    pub fn retrieve(&self, id: &str, options: RequestOptions) -> Result<PendingResult, Error> {
        self.client.execute(&RETRIEVE, &[id], options)
    }

    /// `POST /v1/customers/{id}`; a `null` parameter unsets the field.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if a parameter is invalid or the request cannot be built.
    pub fn update(&self, id: &str, options: RequestOptions) -> Result<PendingResult, Error> {
        self.client.execute(&UPDATE, &[id], options)
    }

    /// `DELETE /v1/customers/{id}`; resolves to the `deleted` marker.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if `id` is empty or the request cannot be built.
    pub fn delete(&self, id: &str, options: RequestOptions) -> Result<PendingResult, Error> {
        self.client.execute(&DELETE, &[id], options)
    }

    /// `GET /v1/customers`, optionally filtered by `email`.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if a filter is invalid or the request cannot be built.
    pub fn list(&self, options: RequestOptions) -> Result<PendingResult, Error> {
        self.client.execute(&LIST, &[], options)
    }
}
