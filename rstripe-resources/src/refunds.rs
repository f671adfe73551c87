//! Refunds of captured charges.

use std::sync::LazyLock;

use rstripe::schema::{as_object_type, as_sublist, as_value_or_pending, primitives, with_metadata};
use rstripe::{
    Error, Method, Operation, PendingResult, RegistryBuilder, RequestOptions, Schema, SchemaError,
};
use rstripe_http::Client;

use crate::{charges, shared};

/// Refund object.
pub const REFUND: &str = "refund";
/// Page of refunds; also embedded in charges.
pub const REFUND_LIST: &str = "refund_list";
/// Refund object or the pending result of a call producing one.
pub const REFUND_RESULT: &str = "refund_result";

const REQUESTABLE_REASONS: [&str; 3] = ["duplicate", "fraudulent", "requested_by_customer"];

pub(crate) fn define(builder: &mut RegistryBuilder) -> Result<(), SchemaError> {
    builder
        .define(REFUND, refund()?)?
        .define(REFUND_LIST, as_sublist(Schema::reference(REFUND)))?
        .define(REFUND_RESULT, as_value_or_pending(Schema::reference(REFUND)))?;
    Ok(())
}

fn refund() -> Result<Schema, SchemaError> {
    let reasons = REQUESTABLE_REASONS
        .iter()
        .copied()
        .chain(["expired_uncaptured_charge"]);
    with_metadata(as_object_type(
        Schema::object()
            .required("id", Schema::reference(primitives::ID))
            .required("amount", Schema::int_range(Some(0), None))
            .required("currency", Schema::reference(primitives::CURRENCY))
            .optional(
                "charge",
                Schema::nullable(shared::expandable(charges::CHARGE)),
            )
            .optional(
                "status",
                Schema::enumeration([
                    "pending",
                    "requires_action",
                    "succeeded",
                    "failed",
                    "canceled",
                ]),
            )
            .optional("reason", Schema::nullable(Schema::enumeration(reasons)))
            .optional("created", Schema::reference(primitives::UNIX_TIMESTAMP)),
        "refund",
    )?)
}

static CREATE: LazyLock<Operation> = LazyLock::new(|| {
    Operation::new("refunds.create", Method::Post, "/v1/refunds")
        .require("charge", Schema::reference(primitives::ID))
        .accept("amount", Schema::int_range(Some(1), None))
        .accept("reason", Schema::enumeration(REQUESTABLE_REASONS))
        .accept("metadata", Schema::reference(primitives::METADATA))
        .returns(REFUND)
});

static RETRIEVE: LazyLock<Operation> = LazyLock::new(|| {
    Operation::new("refunds.retrieve", Method::Get, "/v1/refunds/{id}")
        .accept_all(shared::expand_params())
        .returns(REFUND)
});

static LIST: LazyLock<Operation> = LazyLock::new(|| {
    Operation::new("refunds.list", Method::Get, "/v1/refunds")
        .accept("charge", Schema::reference(primitives::ID))
        .accept_all(shared::list_params())
        .returns(REFUND_LIST)
});

/// Every refund operation.
#[must_use]
pub fn operations() -> [&'static Operation; 3] {
    [&*CREATE, &*RETRIEVE, &*LIST]
}

/// Refund operations, borrowed from a [`Stripe`](crate::Stripe) handle.
#[derive(Debug, Clone, Copy)]
pub struct Refunds<'a> {
    client: &'a Client,
}

#[allow(clippy::needless_pass_by_value)]
impl<'a> Refunds<'a> {
    /// Wraps `client`.
    #[must_use]
    pub const fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// `POST /v1/refunds` for `charge`; refunds the full amount unless
    /// `amount` is given.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if a parameter is invalid or the request cannot be built.
    pub fn create(&self, charge: &str, options: RequestOptions) -> Result<PendingResult, Error> {
        self.client
            .execute(&CREATE, &[], options.param("charge", charge))
    }

    /// `GET /v1/refunds/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if `id` is empty or the request cannot be built.
    pub fn retrieve(&self, id: &str, options: RequestOptions) -> Result<PendingResult, Error> {
        self.client.execute(&RETRIEVE, &[id], options)
    }

    /// `GET /v1/refunds`, optionally filtered by `charge`.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if a filter is invalid or the request cannot be built.
    pub fn list(&self, options: RequestOptions) -> Result<PendingResult, Error> {
        self.client.execute(&LIST, &[], options)
    }
}
