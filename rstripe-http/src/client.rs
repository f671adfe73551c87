//! The request pipeline.
//!
//! A [`Client`] turns a path and [`RequestOptions`] into an authenticated,
//! form-encoded HTTP request, dispatches it on a tokio task and hands back a
//! [`PendingResult`] at once. The task classifies the response:
//!
//! - body decodes and carries an `error` field: [`ApiError`], whatever the status
//! - 2xx without `error`: success
//! - any other decodable body: [`TransportError::UnexpectedStatus`]
//! - undecodable body, network failure, timeout: the matching [`TransportError`]
//!
//! Configuration problems are returned synchronously and never reach the
//! network. So are parameter violations when calling through
//! [`Client::execute`].
//!
//! ## Features
//!
//! - Integrates with `tracing` if the `telemetry` feature is enabled. API keys
//!   and parameter values are never logged.

use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::Duration;

use http::HeaderValue;
use http::header::{CONTENT_TYPE, USER_AGENT};
use rstripe::proto::API_PREFIX;
use rstripe::schema::primitives;
use rstripe::{
    ApiError, ConfigError, Error, Method, Operation, Outcome, PendingResult, Registry,
    RequestOptions, Resolver, TransportError,
};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::{Instrument, Span};

use crate::config::ClientConfig;
use crate::constants::{
    FORM_CONTENT_TYPE, IDEMPOTENCY_KEY_HEADER, STRIPE_ACCOUNT_HEADER, STRIPE_VERSION_HEADER,
};
use crate::encoding;

/// Asynchronous client for the remote payment API.
///
/// Cloning is cheap: clones share configuration, connection pool, in-flight
/// bound and schema registry.
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    http: reqwest::Client,
    permits: Arc<Semaphore>,
    runtime: Handle,
    registry: Registry,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("available_permits", &self.permits.available_permits())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Result schema to enforce on a success value.
struct ResultCheck {
    registry: Registry,
    schema: &'static str,
}

impl ResultCheck {
    fn apply(&self, value: Value) -> Outcome<Value> {
        let violations = self.registry.explain(self.schema, &value);
        if violations.is_empty() {
            Ok(value)
        } else {
            #[cfg(feature = "telemetry")]
            tracing::warn!(
                schema = self.schema,
                violations = violations.len(),
                "response does not match its declared schema"
            );
            Err(TransportError::UnexpectedShape {
                schema: self.schema.to_owned(),
                violations: violations.into(),
            }
            .into())
        }
    }
}

impl Client {
    /// Creates a client that dispatches on the current tokio runtime.
    ///
    /// The client validates results against a registry holding only the
    /// shared primitives; see [`Client::with_registry`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoRuntime`] outside a tokio runtime, or
    /// [`ConfigError::HttpClient`] if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let runtime = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;
        Self::with_runtime(config, runtime)
    }

    /// Creates a client that dispatches on `runtime`.
    ///
    /// Use this from synchronous code that owns a runtime and consumes
    /// results with [`PendingResult::wait`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the HTTP client cannot be built.
    pub fn with_runtime(config: ClientConfig, runtime: Handle) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ConfigError::HttpClient(Box::new(e)))?;
        Ok(Self {
            permits: Arc::new(Semaphore::new(permit_count(&config))),
            config: Arc::new(config),
            http,
            runtime,
            registry: primitive_registry(),
        })
    }

    /// Returns a client with different defaults sharing this one's
    /// connection pool and runtime.
    ///
    /// The in-flight bound is shared too unless `config` changes it.
    #[must_use]
    pub fn with_config(&self, config: ClientConfig) -> Self {
        let permits = if config.max_in_flight() == self.config.max_in_flight() {
            Arc::clone(&self.permits)
        } else {
            Arc::new(Semaphore::new(permit_count(&config)))
        };
        Self {
            config: Arc::new(config),
            http: self.http.clone(),
            permits,
            runtime: self.runtime.clone(),
            registry: self.registry.clone(),
        }
    }

    /// Validates parameters and results against `registry`.
    #[must_use]
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Client defaults.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Registry used by [`Client::execute`].
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Sends a GET; parameters travel in the query string.
    ///
    /// `path` is relative to the API prefix: `charges/ch_1` and
    /// `/v1/charges/ch_1` name the same resource.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the request cannot be built; nothing is sent.
    #[allow(clippy::needless_pass_by_value)]
    pub fn get(&self, path: &str, options: RequestOptions) -> Result<PendingResult, ConfigError> {
        self.dispatch(Method::Get, path, &options, None)
    }

    /// Sends a POST; parameters travel in a form-encoded body.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the request cannot be built; nothing is sent.
    #[allow(clippy::needless_pass_by_value)]
    pub fn post(&self, path: &str, options: RequestOptions) -> Result<PendingResult, ConfigError> {
        self.dispatch(Method::Post, path, &options, None)
    }

    /// Sends a DELETE; the result must have the `deleted` shape.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the request cannot be built; nothing is sent.
    #[allow(clippy::needless_pass_by_value)]
    pub fn delete(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<PendingResult, ConfigError> {
        let check = self
            .registry
            .contains(primitives::DELETED)
            .then_some(primitives::DELETED);
        self.dispatch(Method::Delete, path, &options, check)
    }

    /// Calls `operation`, filling its path template with `path_args`.
    ///
    /// Parameters are checked against the operation's declared schemas
    /// first; a violation is returned here and nothing is sent. The decoded
    /// result is checked against the operation's result schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for bad path arguments or parameters,
    /// or [`Error::Config`] if the request cannot be built.
    #[allow(clippy::needless_pass_by_value)]
    pub fn execute(
        &self,
        operation: &Operation,
        path_args: &[&str],
        options: RequestOptions,
    ) -> Result<PendingResult, Error> {
        let path = operation.path(path_args)?;
        operation.validate_params(&self.registry, &options.params)?;
        Ok(self.dispatch(operation.method(), &path, &options, operation.result())?)
    }

    fn dispatch(
        &self,
        method: Method,
        path: &str,
        options: &RequestOptions,
        result: Option<&'static str>,
    ) -> Result<PendingResult, ConfigError> {
        let request = self.prepare(method, path, options)?;
        let check = result
            .filter(|_| self.config.validate_responses())
            .map(|schema| ResultCheck {
                registry: self.registry.clone(),
                schema,
            });
        let (resolver, pending) = PendingResult::channel();
        let task = run(
            self.http.clone(),
            request,
            Arc::clone(&self.permits),
            self.config.timeout(),
            check,
            resolver,
        );

        #[cfg(feature = "telemetry")]
        let task = task.instrument(tracing::debug_span!(
            "rstripe.request",
            method = %method,
            path = %path,
            status = tracing::field::Empty,
        ));

        self.runtime.spawn(task);
        Ok(pending)
    }

    fn prepare(
        &self,
        method: Method,
        path: &str,
        options: &RequestOptions,
    ) -> Result<reqwest::Request, ConfigError> {
        let api_key = options
            .api_key
            .as_deref()
            .or_else(|| self.config.api_key())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;
        if api_key.contains(':') || api_key.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidApiKey(
                "must not contain whitespace or `:`",
            ));
        }

        let mut url = self.endpoint(path)?;
        let encoded = encoding::encode(&options.params);
        if !method.has_body() && !encoded.is_empty() {
            url.set_query(Some(&encoded));
        }

        let mut builder = self
            .http
            .request(http_method(method), url)
            .basic_auth(api_key, None::<&str>)
            .header(USER_AGENT, header_value("User-Agent", self.config.user_agent())?);
        if let Some(key) = &options.idempotency_key {
            builder = builder.header(
                IDEMPOTENCY_KEY_HEADER,
                header_value(IDEMPOTENCY_KEY_HEADER, key)?,
            );
        }
        if let Some(account) = &options.stripe_account {
            builder = builder.header(
                STRIPE_ACCOUNT_HEADER,
                header_value(STRIPE_ACCOUNT_HEADER, account)?,
            );
        }
        if let Some(version) = options
            .api_version
            .as_deref()
            .or_else(|| self.config.api_version())
        {
            builder = builder.header(
                STRIPE_VERSION_HEADER,
                header_value(STRIPE_VERSION_HEADER, version)?,
            );
        }
        if method.has_body() {
            builder = builder
                .header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
                .body(encoded);
        }

        builder
            .build()
            .map_err(|e| ConfigError::HttpClient(Box::new(e)))
    }

    /// Resolves `path` under the base URL and API prefix.
    fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        let prefix = API_PREFIX.trim_start_matches('/');
        let relative = path.trim_start_matches('/');
        let under_prefix = relative
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
        let relative = if under_prefix {
            relative.to_owned()
        } else {
            format!("{prefix}/{relative}")
        };
        self.config
            .base_url()
            .join(&relative)
            .map_err(|e| ConfigError::InvalidBaseUrl {
                url: self.config.base_url().to_string(),
                reason: format!("cannot join `{path}`: {e}"),
            })
    }
}

fn permit_count(config: &ClientConfig) -> usize {
    config.max_in_flight().clamp(1, Semaphore::MAX_PERMITS)
}

#[allow(clippy::expect_used)]
fn primitive_registry() -> Registry {
    Registry::builder()
        .build()
        .expect("primitive schemas are well formed")
}

const fn http_method(method: Method) -> http::Method {
    match method {
        Method::Get => http::Method::GET,
        Method::Post => http::Method::POST,
        Method::Delete => http::Method::DELETE,
    }
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value).map_err(|_| ConfigError::InvalidHeader(name))
}

/// Worker body: waits for a permit, performs the exchange and resolves.
///
/// `timeout` bounds the whole call, time spent queued for a permit included.
async fn run(
    http: reqwest::Client,
    request: reqwest::Request,
    permits: Arc<Semaphore>,
    timeout: Option<Duration>,
    check: Option<ResultCheck>,
    resolver: Resolver,
) {
    let exchange = async {
        // The semaphore is never closed; on failure the dropped resolver
        // reports `TransportError::Dropped`.
        let _permit = permits.acquire_owned().await.ok()?;

        #[cfg(feature = "telemetry")]
        tracing::debug!("request dispatched");

        let outcome = send(&http, request).await;
        Some(match &check {
            Some(check) => outcome.and_then(|value| check.apply(value)),
            None => outcome,
        })
    };
    let outcome = match timeout {
        Some(limit) => tokio::time::timeout(limit, exchange)
            .await
            .unwrap_or_else(|_| Some(Err(TransportError::Timeout.into()))),
        None => exchange.await,
    };
    let Some(outcome) = outcome else {
        return;
    };
    record_outcome_on_span(&outcome);

    if !resolver.resolve(outcome) {
        #[cfg(feature = "telemetry")]
        tracing::debug!("caller dropped the pending result; outcome discarded");
    }
}

async fn send(http: &reqwest::Client, request: reqwest::Request) -> Outcome<Value> {
    let response = http.execute(request).await.map_err(transport_error)?;
    let status = response.status().as_u16();

    #[cfg(feature = "telemetry")]
    Span::current().record("status", status);

    let body = response.bytes().await.map_err(transport_error)?;
    classify(status, &body)
}

fn transport_error(err: reqwest::Error) -> rstripe::RequestError {
    if err.is_timeout() {
        TransportError::Timeout.into()
    } else {
        TransportError::network(err).into()
    }
}

/// Classifies a response by status and body.
///
/// A present, non-null `error` field always wins, even on 2xx.
///
/// # Errors
///
/// Returns the [`ApiError`] or [`TransportError`] the response amounts to.
pub fn classify(status: u16, body: &[u8]) -> Outcome<Value> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| TransportError::decode(status, e))?;
    if let Some(error) = value.get("error").filter(|error| !error.is_null()) {
        return Err(ApiError::from_payload(status, error).into());
    }
    if (200..300).contains(&status) {
        Ok(value)
    } else {
        Err(TransportError::UnexpectedStatus {
            status,
            body: value,
        }
        .into())
    }
}

/// Records the outcome of a request on the current span.
#[cfg(feature = "telemetry")]
fn record_outcome_on_span<T, E: Display>(outcome: &Result<T, E>) {
    match outcome {
        Ok(_) => tracing::debug!("request succeeded"),
        Err(err) => tracing::warn!(error = %err, "request failed"),
    }
}

/// Records the outcome of a request on the current span.
/// Noop if telemetry feature is off.
#[cfg(not(feature = "telemetry"))]
fn record_outcome_on_span<T, E: Display>(_outcome: &Result<T, E>) {}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::FutureExt;
    use rstripe::RequestError;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_string, body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> ClientConfig {
        ClientConfig::new("sk_test_123")
            .with_base_url(&server.uri())
            .unwrap()
    }

    fn client(server: &MockServer) -> Client {
        Client::new(config(server)).unwrap()
    }

    #[tokio::test]
    async fn test_get_sends_query_and_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/charges"))
            .and(query_param("limit", "3"))
            .and(query_param("created[gte]", "100"))
            .and(header("authorization", "Basic c2tfdGVzdF8xMjM6"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list", "has_more": false, "url": "/v1/charges", "data": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let options = RequestOptions::new()
            .param("limit", 3)
            .param("created", json!({"gte": 100}));
        let value = client(&server).get("charges", options).unwrap().await.unwrap();
        assert_eq!(value["object"], "list");
    }

    #[tokio::test]
    async fn test_post_sends_form_body_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/customers"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(header("idempotency-key", "key-1"))
            .and(header("stripe-account", "acct_9"))
            .and(header("stripe-version", "2024-06-20"))
            .and(body_string("email=a%40b.com&metadata%5Bplan%5D=gold"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "cus_1", "object": "customer"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new(config(&server).with_api_version("2024-06-20")).unwrap();
        let options = RequestOptions::new()
            .param("email", "a@b.com")
            .param("metadata", json!({"plan": "gold"}))
            .idempotency_key("key-1")
            .stripe_account("acct_9");
        let value = client.post("/v1/customers", options).unwrap().await.unwrap();
        assert_eq!(value["id"], "cus_1");
    }

    #[tokio::test]
    async fn test_per_call_api_key_overrides_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/balance"))
            .and(header("authorization", "Basic b3RoZXI6"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"object": "balance"})))
            .expect(1)
            .mount(&server)
            .await;

        let options = RequestOptions::new().api_key("other");
        assert!(client(&server).get("balance", options).unwrap().await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_api_key_is_synchronous_config_error() {
        let server = MockServer::start().await;
        let client = Client::new(ClientConfig::default().with_base_url(&server.uri()).unwrap())
            .unwrap();
        let err = client.get("charges", RequestOptions::new()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_header_value_is_config_error() {
        let server = MockServer::start().await;
        let options = RequestOptions::new().idempotency_key("line\nbreak");
        let err = client(&server).post("charges", options).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHeader("Idempotency-Key")));
    }

    #[tokio::test]
    async fn test_error_field_on_200_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/balance"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"error": {"message": "bad key"}})),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .get("balance", RequestOptions::new())
            .unwrap()
            .await
            .unwrap_err();
        let api = err.as_api().unwrap();
        assert_eq!(api.message(), Some("bad key"));
        assert_eq!(api.status, 200);
    }

    #[tokio::test]
    async fn test_unparsable_402_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/charges"))
            .respond_with(ResponseTemplate::new(402).set_body_string("<html>Payment Required</html>"))
            .mount(&server)
            .await;

        let err = client(&server)
            .post("charges", RequestOptions::new().param("amount", 100))
            .unwrap()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RequestError::Transport(TransportError::Decode { status: 402, .. })
        ));
    }

    #[tokio::test]
    async fn test_card_error_on_402_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/charges"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "error": {"type": "card_error", "code": "card_declined", "message": "Declined."}
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .post("charges", RequestOptions::new())
            .unwrap()
            .await
            .unwrap_err();
        assert!(err.as_api().unwrap().is_card_error());
    }

    #[tokio::test]
    async fn test_non_2xx_without_error_field_is_unexpected_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/balance"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({"status": "down"})))
            .mount(&server)
            .await;

        let err = client(&server)
            .get("balance", RequestOptions::new())
            .unwrap()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RequestError::Transport(TransportError::UnexpectedStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_fetches_resolve_independently() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/customers/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "slow"}))
                    .set_delay(Duration::from_millis(400)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/customers/fast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "fast"})))
            .mount(&server)
            .await;

        let client = client(&server);
        let mut slow = client.get("customers/slow", RequestOptions::new()).unwrap();
        let fast = client.get("customers/fast", RequestOptions::new()).unwrap();

        assert_eq!(fast.await.unwrap()["id"], "fast");
        assert!((&mut slow).now_or_never().is_none());
        assert_eq!(slow.await.unwrap()["id"], "slow");
    }

    #[tokio::test]
    async fn test_timeout_is_transport_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/balance"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client =
            Client::new(config(&server).with_timeout(Some(Duration::from_millis(50)))).unwrap();
        let err = client
            .get("balance", RequestOptions::new())
            .unwrap()
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_delete_checks_deleted_shape() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/customers/cus_1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"deleted": "true", "id": "cus_1"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v1/customers/cus_2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"deleted": true, "id": "cus_2"})),
            )
            .mount(&server)
            .await;

        let client = client(&server);
        let ok = client.delete("customers/cus_1", RequestOptions::new()).unwrap();
        assert_eq!(ok.await.unwrap()["deleted"], "true");

        let err = client
            .delete("customers/cus_2", RequestOptions::new())
            .unwrap()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RequestError::Transport(TransportError::UnexpectedShape { ref schema, .. }) if schema == "deleted"
        ));

        let lenient = client.with_config(config(&server).with_validate_responses(false));
        let value = lenient
            .delete("customers/cus_2", RequestOptions::new())
            .unwrap()
            .await
            .unwrap();
        assert_eq!(value["deleted"], true);
    }

    #[tokio::test]
    async fn test_execute_rejects_invalid_params_before_sending() {
        let server = MockServer::start().await;
        let operation = Operation::new("charges.create", Method::Post, "/v1/charges")
            .require("amount", rstripe::Schema::int_range(Some(1), None))
            .require("currency", rstripe::Schema::reference(primitives::CURRENCY));

        let err = client(&server)
            .execute(&operation, &[], RequestOptions::new().param("amount", 0))
            .unwrap_err();
        match err {
            Error::Validation(err) => assert_eq!(err.violations.len(), 2),
            other => panic!("expected a validation error, got {other:?}"),
        }
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_execute_fills_path_and_checks_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/charges/ch_1/capture"))
            .and(body_string_contains("amount=500"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "ch_1"})))
            .mount(&server)
            .await;

        let operation = Operation::new("charges.capture", Method::Post, "/v1/charges/{id}/capture")
            .accept("amount", rstripe::Schema::integer())
            .returns(primitives::DELETED);
        let err = client(&server)
            .execute(&operation, &["ch_1"], RequestOptions::new().param("amount", 500))
            .unwrap()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RequestError::Transport(TransportError::UnexpectedShape { .. })
        ));
    }

    #[tokio::test]
    async fn test_in_flight_bound_queues_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/balance"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"object": "balance"}))
                    .set_delay(Duration::from_millis(100)),
            )
            .expect(3)
            .mount(&server)
            .await;

        let client = Client::new(config(&server).with_max_in_flight(1)).unwrap();
        let pending: Vec<_> = (0..3)
            .map(|_| client.get("balance", RequestOptions::new()).unwrap())
            .collect();
        for result in pending {
            assert!(result.await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_timeout_counts_time_queued_for_a_permit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/balance"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"object": "balance"}))
                    .set_delay(Duration::from_millis(60)),
            )
            .mount(&server)
            .await;

        let client = Client::new(
            config(&server)
                .with_max_in_flight(1)
                .with_timeout(Some(Duration::from_millis(150))),
        )
        .unwrap();
        let pending: Vec<_> = (0..4)
            .map(|_| client.get("balance", RequestOptions::new()).unwrap())
            .collect();
        let outcomes = futures_util::future::join_all(pending).await;

        assert!(outcomes[0].is_ok());
        assert!(outcomes[3].as_ref().is_err_and(RequestError::is_timeout));
    }

    #[tokio::test]
    async fn test_abandoned_result_releases_its_permit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/balance"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"object": "balance"}))
                    .set_delay(Duration::from_millis(50)),
            )
            .expect(2)
            .mount(&server)
            .await;

        let client = Client::new(config(&server).with_max_in_flight(1)).unwrap();
        drop(client.get("balance", RequestOptions::new()).unwrap());
        let second = client.get("balance", RequestOptions::new()).unwrap();
        let value = tokio::time::timeout(Duration::from_secs(5), second)
            .await
            .expect("second call was starved of its permit")
            .unwrap();
        assert_eq!(value["object"], "balance");
    }

    #[test]
    fn test_blocking_wait_with_explicit_runtime() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let server = runtime.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/v1/balance"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"object": "balance"})))
                .mount(&server)
                .await;
            server
        });

        let client = Client::with_runtime(config(&server), runtime.handle().clone()).unwrap();
        let value = client
            .get("balance", RequestOptions::new())
            .unwrap()
            .wait()
            .unwrap();
        assert_eq!(value["object"], "balance");
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        assert!(matches!(
            Client::new(ClientConfig::new("sk_test_123")),
            Err(ConfigError::NoRuntime)
        ));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(200, br#"{"id":"x"}"#).unwrap(), json!({"id": "x"}));
        assert_eq!(classify(200, br#"{"error":null,"id":"x"}"#).unwrap()["id"], "x");
        assert!(classify(404, br#"{"error":{"type":"invalid_request_error"}}"#)
            .unwrap_err()
            .as_api()
            .is_some());
        assert!(matches!(
            classify(200, b""),
            Err(RequestError::Transport(TransportError::Decode { status: 200, .. }))
        ));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let client =
            Client::with_runtime(ClientConfig::new("sk_live_secret"), runtime.handle().clone())
                .unwrap();
        assert!(!format!("{client:?}").contains("sk_live_secret"));
    }
}
