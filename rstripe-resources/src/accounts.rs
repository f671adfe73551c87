//! Connected accounts.
//!
//! `create` fills in `country=US` for `standard` and `custom` accounts when
//! the caller leaves it out.

use std::sync::LazyLock;

use rstripe::schema::{
    ObjectSchema, as_object_type, as_sublist, as_value_or_pending, primitives, with_metadata,
};
use rstripe::{
    Error, Method, Operation, PendingResult, RegistryBuilder, RequestOptions, Schema, SchemaError,
};
use rstripe_http::Client;

use crate::shared;

/// Account object.
pub const ACCOUNT: &str = "account";
/// Page of accounts.
pub const ACCOUNT_LIST: &str = "account_list";
/// Account object or the pending result of a call producing one.
pub const ACCOUNT_RESULT: &str = "account_result";
/// `standard`, `express` or `custom`.
pub const ACCOUNT_TYPE: &str = "account_type";

/// Country assumed for new `standard` and `custom` accounts.
pub const DEFAULT_COUNTRY: &str = "US";

const REJECT_REASONS: [&str; 3] = ["fraud", "terms_of_service", "other"];

pub(crate) fn define(builder: &mut RegistryBuilder) -> Result<(), SchemaError> {
    builder
        .define(
            ACCOUNT_TYPE,
            Schema::enumeration(["standard", "express", "custom"]),
        )?
        .define(ACCOUNT, account()?)?
        .define(ACCOUNT_LIST, as_sublist(Schema::reference(ACCOUNT)))?
        .define(
            ACCOUNT_RESULT,
            as_value_or_pending(Schema::reference(ACCOUNT)),
        )?;
    Ok(())
}

fn business_type() -> Schema {
    Schema::enumeration(["individual", "company", "non_profit", "government_entity"])
}

fn business_profile() -> Schema {
    Schema::object()
        .optional("name", Schema::nullable(Schema::string()))
        .optional("url", Schema::nullable(Schema::string()))
        .optional("mcc", Schema::nullable(Schema::fixed_len(4)))
        .optional("support_email", Schema::nullable(Schema::string()))
        .into()
}

fn decline_charge_on() -> Schema {
    Schema::object()
        .optional("avs_failure", Schema::boolean())
        .optional("cvc_failure", Schema::boolean())
        .into()
}

fn account() -> Result<Schema, SchemaError> {
    with_metadata(as_object_type(
        Schema::object()
            .required("id", Schema::reference(primitives::ID))
            .optional("type", Schema::reference(ACCOUNT_TYPE))
            .optional("country", Schema::reference(primitives::COUNTRY))
            .optional("email", Schema::nullable(Schema::string()))
            .optional(
                "default_currency",
                Schema::reference(primitives::CURRENCY),
            )
            .optional("business_type", Schema::nullable(business_type()))
            .optional("business_profile", Schema::nullable(business_profile()))
            .optional("charges_enabled", Schema::boolean())
            .optional("payouts_enabled", Schema::boolean())
            .optional("details_submitted", Schema::boolean())
            .optional("created", Schema::reference(primitives::UNIX_TIMESTAMP)),
        "account",
    )?)
}

/// Parameters accepted by both create and update.
fn writable_params() -> ObjectSchema {
    Schema::object()
        .optional("email", Schema::string())
        .optional("business_type", business_type())
        .optional("business_profile", business_profile())
        .optional(
            "default_currency",
            Schema::reference(primitives::CURRENCY),
        )
        .optional("decline_charge_on", decline_charge_on())
        .optional("metadata", Schema::reference(primitives::METADATA))
}

static CREATE: LazyLock<Operation> = LazyLock::new(|| {
    Operation::new("accounts.create", Method::Post, "/v1/accounts")
        .require("type", Schema::reference(ACCOUNT_TYPE))
        .accept("country", Schema::reference(primitives::COUNTRY))
        .accept_all(writable_params())
        .returns(ACCOUNT)
});

static RETRIEVE: LazyLock<Operation> = LazyLock::new(|| {
    Operation::new("accounts.retrieve", Method::Get, "/v1/accounts/{id}")
        .accept_all(shared::expand_params())
        .returns(ACCOUNT)
});

static UPDATE: LazyLock<Operation> = LazyLock::new(|| {
    Operation::new("accounts.update", Method::Post, "/v1/accounts/{id}")
        .accept_all(writable_params())
        .returns(ACCOUNT)
});

static DELETE: LazyLock<Operation> = LazyLock::new(|| {
    Operation::new("accounts.delete", Method::Delete, "/v1/accounts/{id}")
        .returns(primitives::DELETED)
});

static LIST: LazyLock<Operation> = LazyLock::new(|| {
    Operation::new("accounts.list", Method::Get, "/v1/accounts")
        .accept_all(shared::list_params())
        .returns(ACCOUNT_LIST)
});

static REJECT: LazyLock<Operation> = LazyLock::new(|| {
    Operation::new("accounts.reject", Method::Post, "/v1/accounts/{id}/reject")
        .require("reason", Schema::enumeration(REJECT_REASONS))
        .returns(ACCOUNT)
});

/// Every account operation.
#[must_use]
pub fn operations() -> [&'static Operation; 6] {
    [&*CREATE, &*RETRIEVE, &*UPDATE, &*DELETE, &*LIST, &*REJECT]
}

/// Adds `country=US` to `standard` and `custom` account creation.
fn with_default_country(options: RequestOptions) -> RequestOptions {
    match options.param_str("type") {
        Some("standard" | "custom") => options.default_param("country", DEFAULT_COUNTRY),
        _ => options,
    }
}

/// Account operations, borrowed from a [`Stripe`](crate::Stripe) handle.
#[derive(Debug, Clone, Copy)]
pub struct Accounts<'a> {
    client: &'a Client,
}

#[allow(clippy::needless_pass_by_value)]
impl<'a> Accounts<'a> {
    /// Wraps `client`.
    #[must_use]
    pub const fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// `POST /v1/accounts`.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if `type` is missing, a parameter is invalid, or
    /// the request cannot be built.
    pub fn create(&self, options: RequestOptions) -> Result<PendingResult, Error> {
        self.client
            .execute(&CREATE, &[], with_default_country(options))
    }

    /// `GET /v1/accounts/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if `id` is empty or the request cannot be built.
    pub fn retrieve(&self, id: &str, options: RequestOptions) -> Result<PendingResult, Error> {
        self.client.execute(&RETRIEVE, &[id], options)
    }

    /// `POST /v1/accounts/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if a parameter is invalid or the request cannot be built.
    pub fn update(&self, id: &str, options: RequestOptions) -> Result<PendingResult, Error> {
        self.client.execute(&UPDATE, &[id], options)
    }

    /// `DELETE /v1/accounts/{id}`; resolves to the `deleted` marker.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if `id` is empty or the request cannot be built.
    pub fn delete(&self, id: &str, options: RequestOptions) -> Result<PendingResult, Error> {
        self.client.execute(&DELETE, &[id], options)
    }

    /// `GET /v1/accounts`.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if a pagination parameter is invalid or the request
    /// cannot be built.
    pub fn list(&self, options: RequestOptions) -> Result<PendingResult, Error> {
        self.client.execute(&LIST, &[], options)
    }

    /// `POST /v1/accounts/{id}/reject`; `reason` is `fraud`,
    /// `terms_of_service` or `other`.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if `reason` is not accepted or the request cannot be built.
    pub fn reject(
        &self,
        id: &str,
        reason: &str,
        options: RequestOptions,
    ) -> Result<PendingResult, Error> {
        self.client
            .execute(&REJECT, &[id], options.param("reason", reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;
    use crate::testing::stripe;
    use rstripe::Candidate;
    use serde_json::{Value, json};
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn account_json(id: &str) -> Value {
        json!({
            "id": id,
            "object": "account",
            "type": "standard",
            "country": "US",
            "email": "a@b.com",
            "charges_enabled": false,
            "metadata": {}
        })
    }

    async fn bodies(server: &MockServer) -> Vec<String> {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| String::from_utf8_lossy(&request.body).into_owned())
            .collect()
    }

    #[tokio::test]
    async fn test_create_standard_defaults_country_to_us() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts"))
            .and(body_string_contains("country=US"))
            .and(body_string_contains("type=standard"))
            .and(body_string_contains("email=a%40b.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(account_json("acct_1")))
            .expect(1)
            .mount(&server)
            .await;

        let stripe = stripe(&server);
        let options = RequestOptions::new()
            .param("type", "standard")
            .param("email", "a@b.com");
        let account = stripe.accounts().create(options).unwrap().await.unwrap();
        assert_eq!(account["id"], "acct_1");
    }

    #[tokio::test]
    async fn test_create_keeps_explicit_country_and_skips_express() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(account_json("acct_2")))
            .mount(&server)
            .await;

        let stripe = stripe(&server);
        let custom = RequestOptions::new().param("type", "custom").param("country", "DE");
        stripe.accounts().create(custom).unwrap().await.unwrap();
        let express = RequestOptions::new().param("type", "express");
        stripe.accounts().create(express).unwrap().await.unwrap();

        let bodies = bodies(&server).await;
        assert_eq!(bodies.len(), 2);
        assert!(bodies.iter().any(|b| b.contains("country=DE") && !b.contains("country=US")));
        assert!(bodies.iter().any(|b| b.contains("type=express") && !b.contains("country")));
    }

    #[tokio::test]
    async fn test_create_without_type_is_rejected_locally() {
        let server = MockServer::start().await;
        let stripe = stripe(&server);
        let err = stripe
            .accounts()
            .create(RequestOptions::new().param("email", "a@b.com"))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ref v) if v.violations[0].path == "type"));
        assert!(bodies(&server).await.is_empty());
    }

    #[tokio::test]
    async fn test_create_result_is_a_pending_account_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(account_json("acct_3")))
            .mount(&server)
            .await;

        let stripe = stripe(&server);
        let pending = stripe
            .accounts()
            .create(RequestOptions::new().param("type", "express"))
            .unwrap();
        assert!(registry().validate_candidate(ACCOUNT_RESULT, Candidate::from(&pending)));
        let value = pending.await.unwrap();
        assert!(registry().validate_candidate(ACCOUNT_RESULT, Candidate::from(&value)));
    }

    #[tokio::test]
    async fn test_reject_sends_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts/acct_1/reject"))
            .and(body_string_contains("reason=fraud"))
            .respond_with(ResponseTemplate::new(200).set_body_json(account_json("acct_1")))
            .expect(1)
            .mount(&server)
            .await;

        let stripe = stripe(&server);
        stripe
            .accounts()
            .reject("acct_1", "fraud", RequestOptions::new())
            .unwrap()
            .await
            .unwrap();
        assert!(
            stripe
                .accounts()
                .reject("acct_1", "bored", RequestOptions::new())
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_delete_resolves_to_deleted_marker() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/accounts/acct_1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"deleted": "true", "id": "acct_1"})),
            )
            .mount(&server)
            .await;

        let stripe = stripe(&server);
        let deleted: rstripe::proto::Deleted = stripe
            .accounts()
            .delete("acct_1", RequestOptions::new())
            .unwrap()
            .typed()
            .await
            .unwrap();
        assert_eq!(deleted.id, "acct_1");
    }

    #[tokio::test]
    async fn test_retrieve_rejects_mistyped_object() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/accounts/acct_1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "acct_1", "object": "customer"})),
            )
            .mount(&server)
            .await;

        let err = stripe(&server)
            .accounts()
            .retrieve("acct_1", RequestOptions::new())
            .unwrap()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            rstripe::RequestError::Transport(rstripe::TransportError::UnexpectedShape { .. })
        ));
    }

    #[test]
    fn test_account_schema() {
        let registry = registry();
        assert!(registry.validate(ACCOUNT, &account_json("acct_1")));
        assert!(!registry.validate(ACCOUNT, &json!({"id": "acct_1", "object": "account", "type": "premium"})));
        assert!(registry.validate(
            ACCOUNT_LIST,
            &json!({"object": "list", "has_more": false, "url": "/v1/accounts", "data": []})
        ));
        assert!(!registry.validate(
            ACCOUNT_LIST,
            &json!({"object": "list", "has_more": false, "url": "/v1/accounts", "data": [{"id": "acct_1"}]})
        ));
    }
}
