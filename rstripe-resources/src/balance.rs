//! Account balance.

use std::sync::LazyLock;

use rstripe::schema::{as_object_type, primitives};
use rstripe::{
    Error, Method, Operation, PendingResult, RegistryBuilder, RequestOptions, Schema, SchemaError,
};
use rstripe_http::Client;

/// Balance object.
pub const BALANCE: &str = "balance";
/// One currency's share of a balance.
pub const BALANCE_AMOUNT: &str = "balance_amount";

pub(crate) fn define(builder: &mut RegistryBuilder) -> Result<(), SchemaError> {
    let funds = || Schema::seq(Schema::reference(BALANCE_AMOUNT));
    builder
        .define(
            BALANCE_AMOUNT,
            Schema::object()
                .required("amount", Schema::integer())
                .required("currency", Schema::reference(primitives::CURRENCY))
                .optional("source_types", Schema::map_of(Schema::integer(), None)),
        )?
        .define(
            BALANCE,
            as_object_type(
                Schema::object()
                    .required("available", funds())
                    .required("pending", funds())
                    .optional("livemode", Schema::boolean()),
                "balance",
            )?,
        )?;
    Ok(())
}

static RETRIEVE: LazyLock<Operation> = LazyLock::new(|| {
    Operation::new("balance.retrieve", Method::Get, "/v1/balance").returns(BALANCE)
});

/// Every balance operation.
#[must_use]
pub fn operations() -> [&'static Operation; 1] {
    [&*RETRIEVE]
}

/// Balance operations, borrowed from a [`Stripe`](crate::Stripe) handle.
#[derive(Debug, Clone, Copy)]
pub struct Balance<'a> {
    client: &'a Client,
}

impl<'a> Balance<'a> {
    /// Wraps `client`.
    #[must_use]
    pub const fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// `GET /v1/balance`; use `stripe_account` in `options` to read a
    /// connected account's balance.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if the request cannot be built.
    pub fn retrieve(&self, options: RequestOptions) -> Result<PendingResult, Error> {
        self.client.execute(&RETRIEVE, &[], options)
    }
}
