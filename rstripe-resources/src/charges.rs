//! Charges against a card or customer.

use std::sync::LazyLock;

use rstripe::schema::{
    ObjectSchema, as_object_type, as_sublist, as_value_or_pending, primitives, with_metadata,
};
use rstripe::{
    Error, Method, Operation, PendingResult, RegistryBuilder, RequestOptions, Schema, SchemaError,
};
use rstripe_http::Client;

use crate::{customers, refunds, shared};

/// Charge object.
pub const CHARGE: &str = "charge";
/// Page of charges.
pub const CHARGE_LIST: &str = "charge_list";
/// Charge object or the pending result of a call producing one.
pub const CHARGE_RESULT: &str = "charge_result";

pub(crate) fn define(builder: &mut RegistryBuilder) -> Result<(), SchemaError> {
    builder
        .define(CHARGE, charge()?)?
        .define(CHARGE_LIST, as_sublist(Schema::reference(CHARGE)))?
        .define(CHARGE_RESULT, as_value_or_pending(Schema::reference(CHARGE)))?;
    Ok(())
}

fn non_negative() -> Schema {
    Schema::int_range(Some(0), None)
}

fn nullable_string() -> Schema {
    Schema::nullable(Schema::string())
}

fn charge() -> Result<Schema, SchemaError> {
    with_metadata(as_object_type(
        Schema::object()
            .required("id", Schema::reference(primitives::ID))
            .required("amount", non_negative())
            .required("currency", Schema::reference(primitives::CURRENCY))
            .optional("amount_captured", non_negative())
            .optional("amount_refunded", non_negative())
            .optional("captured", Schema::boolean())
            .optional("paid", Schema::boolean())
            .optional("refunded", Schema::boolean())
            .optional("livemode", Schema::boolean())
            .optional(
                "status",
                Schema::enumeration(["succeeded", "pending", "failed"]),
            )
            .optional(
                "customer",
                Schema::nullable(shared::expandable(customers::CUSTOMER)),
            )
            .optional("description", nullable_string())
            .optional("receipt_email", nullable_string())
            .optional(
                "statement_descriptor",
                Schema::nullable(Schema::reference(primitives::STATEMENT_DESCRIPTOR)),
            )
            .optional("failure_code", nullable_string())
            .optional("failure_message", nullable_string())
            .optional("source", Schema::nullable(shared::expandable(shared::CARD)))
            .optional("refunds", Schema::reference(refunds::REFUND_LIST))
            .optional("created", Schema::reference(primitives::UNIX_TIMESTAMP)),
        "charge",
    )?)
}

/// Parameters accepted by both create and update.
fn writable_params() -> ObjectSchema {
    Schema::object()
        .optional("customer", Schema::reference(primitives::ID))
        .optional("description", Schema::string())
        .optional("receipt_email", Schema::string())
        .optional("metadata", Schema::reference(primitives::METADATA))
}

static CREATE: LazyLock<Operation> = LazyLock::new(|| {
    Operation::new("charges.create", Method::Post, "/v1/charges")
        .require("amount", Schema::int_range(Some(1), None))
        .require("currency", Schema::reference(primitives::CURRENCY))
        .accept("source", Schema::reference(primitives::ID))
        .accept("capture", Schema::boolean())
        .accept(
            "statement_descriptor",
            Schema::reference(primitives::STATEMENT_DESCRIPTOR),
        )
        .accept("application_fee_amount", non_negative())
        .accept("on_behalf_of", Schema::reference(primitives::ID))
        .accept(
            "transfer_data",
            Schema::object().required("destination", Schema::reference(primitives::ID)),
        )
        .accept_all(writable_params())
        .returns(CHARGE)
});

static RETRIEVE: LazyLock<Operation> = LazyLock::new(|| {
    Operation::new("charges.retrieve", Method::Get, "/v1/charges/{id}")
        .accept_all(shared::expand_params())
        .returns(CHARGE)
});

static UPDATE: LazyLock<Operation> = LazyLock::new(|| {
    Operation::new("charges.update", Method::Post, "/v1/charges/{id}")
        .accept_all(writable_params())
        .returns(CHARGE)
});

static CAPTURE: LazyLock<Operation> = LazyLock::new(|| {
    Operation::new("charges.capture", Method::Post, "/v1/charges/{id}/capture")
        .accept("amount", Schema::int_range(Some(1), None))
        .accept("receipt_email", Schema::string())
        .accept(
            "statement_descriptor",
            Schema::reference(primitives::STATEMENT_DESCRIPTOR),
        )
        .accept("application_fee_amount", non_negative())
        .returns(CHARGE)
});

static LIST: LazyLock<Operation> = LazyLock::new(|| {
    Operation::new("charges.list", Method::Get, "/v1/charges")
        .accept("customer", Schema::reference(primitives::ID))
        .accept_all(shared::list_params())
        .returns(CHARGE_LIST)
});

/// Every charge operation.
#[must_use]
pub fn operations() -> [&'static Operation; 5] {
    [&*CREATE, &*RETRIEVE, &*UPDATE, &*CAPTURE, &*LIST]
}

/// Charge operations, borrowed from a [`Stripe`](crate::Stripe) handle.
#[derive(Debug, Clone, Copy)]
pub struct Charges<'a> {
    client: &'a Client,
}

#[allow(clippy::needless_pass_by_value)]
impl<'a> Charges<'a> {
    /// Wraps `client`.
    #[must_use]
    pub const fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// `POST /v1/charges`; `amount` and `currency` are required.
    ///
    /// Pass an idempotency key in `options` to make retries safe.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if a parameter is missing or invalid, or the
    /// request cannot be built.
    pub fn create(&self, options: RequestOptions) -> Result<PendingResult, Error> {
        self.client.execute(&CREATE, &[], options)
    }

    /// `GET /v1/charges/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if `id` is empty or the request cannot be built.
    pub fn retrieve(&self, id: &str, options: RequestOptions) -> Result<PendingResult, Error> {
        self.client.execute(&RETRIEVE, &[id], options)
    }

    /// `POST /v1/charges/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if a parameter is invalid or the request cannot be built.
    pub fn update(&self, id: &str, options: RequestOptions) -> Result<PendingResult, Error> {
        self.client.execute(&UPDATE, &[id], options)
    }

    /// `POST /v1/charges/{id}/capture`; captures all of an uncaptured
    /// charge unless `amount` is given.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if a parameter is invalid or the request cannot be built.
    pub fn capture(&self, id: &str, options: RequestOptions) -> Result<PendingResult, Error> {
        self.client.execute(&CAPTURE, &[id], options)
    }

    /// `GET /v1/charges`, optionally filtered by `customer`.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if a filter is invalid or the request cannot be built.
    pub fn list(&self, options: RequestOptions) -> Result<PendingResult, Error> {
        self.client.execute(&LIST, &[], options)
    }
}
