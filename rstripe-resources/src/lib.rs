#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Resource modules for the rstripe payment API client.
//!
//! Each module declares its object shapes in the process-wide [`registry`]
//! and its endpoints as immutable [`Operation`](rstripe::Operation)s, then
//! issues calls through the [`rstripe_http::Client`] pipeline:
//!
//! - [`accounts`] - Connected accounts: create, retrieve, update, delete, list, reject
//! - [`charges`] - Charges: create, retrieve, update, capture, list
//! - [`customers`] - Customers: create, retrieve, update, delete, list
//! - [`refunds`] - Refunds: create, retrieve, list
//! - [`balance`] - Balance: retrieve
//!
//! # Example
//!
//! ```rust,no_run
//! use rstripe::RequestOptions;
//! use rstripe_http::ClientConfig;
//! use rstripe_resources::Stripe;
//!
//! # async fn demo() -> Result<(), rstripe::Error> {
//! let stripe = Stripe::new(ClientConfig::from_env()?)?;
//! let account = stripe
//!     .accounts()
//!     .create(RequestOptions::new().param("type", "standard").param("email", "a@b.com"))?
//!     .await?;
//! println!("created {}", account["id"]);
//! # Ok(())
//! # }
//! ```

pub mod accounts;
pub mod balance;
pub mod charges;
pub mod customers;
pub mod refunds;
pub mod shared;

use std::sync::LazyLock;

use rstripe::{ConfigError, Operation, Registry, SchemaError};
use rstripe_http::{Client, ClientConfig};
use tokio::runtime::Handle;

pub use accounts::Accounts;
pub use balance::Balance;
pub use charges::Charges;
pub use customers::Customers;
pub use refunds::Refunds;

static REGISTRY: LazyLock<Registry> =
    LazyLock::new(|| build_registry().expect("resource schemas are well formed"));

/// The process-wide registry: the shared primitives plus every resource shape.
///
/// Built on first use and never mutated afterwards.
///
/// # Panics
///
/// Panics if a resource schema is malformed, which is a programming error.
#[must_use]
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Builds a fresh registry with every resource shape.
///
/// # Errors
///
/// Returns [`SchemaError`] if a definition is malformed or refers to an
/// undefined name.
pub fn build_registry() -> Result<Registry, SchemaError> {
    let mut builder = Registry::builder();
    shared::define(&mut builder)?;
    accounts::define(&mut builder)?;
    balance::define(&mut builder)?;
    charges::define(&mut builder)?;
    customers::define(&mut builder)?;
    refunds::define(&mut builder)?;
    builder.build()
}

/// Every operation of every resource.
#[must_use]
pub fn operations() -> impl Iterator<Item = &'static Operation> {
    accounts::operations()
        .into_iter()
        .chain(balance::operations())
        .chain(charges::operations())
        .chain(customers::operations())
        .chain(refunds::operations())
}

/// Entry point: a pipeline client bound to the resource [`registry`].
#[derive(Debug, Clone)]
pub struct Stripe {
    client: Client,
}

impl Stripe {
    /// Creates a handle dispatching on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] outside a runtime or if the HTTP client
    /// cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_client(Client::new(config)?))
    }

    /// Creates a handle dispatching on `runtime`, for synchronous callers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the HTTP client cannot be built.
    pub fn with_runtime(config: ClientConfig, runtime: Handle) -> Result<Self, ConfigError> {
        Ok(Self::from_client(Client::with_runtime(config, runtime)?))
    }

    /// Wraps an existing client, switching it to the resource registry.
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self {
            client: client.with_registry(registry().clone()),
        }
    }

    /// Returns a handle with different defaults sharing this one's
    /// connection pool.
    #[must_use]
    pub fn with_config(&self, config: ClientConfig) -> Self {
        Self {
            client: self.client.with_config(config),
        }
    }

    /// The underlying pipeline client, for raw `get`/`post`/`delete` calls.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Account operations.
    #[must_use]
    pub const fn accounts(&self) -> Accounts<'_> {
        Accounts::new(&self.client)
    }

    /// Balance operations.
    #[must_use]
    pub const fn balance(&self) -> Balance<'_> {
        Balance::new(&self.client)
    }

    /// Charge operations.
    #[must_use]
    pub const fn charges(&self) -> Charges<'_> {
        Charges::new(&self.client)
    }

    /// Customer operations.
    #[must_use]
    pub const fn customers(&self) -> Customers<'_> {
        Customers::new(&self.client)
    }

    /// Refund operations.
    #[must_use]
    pub const fn refunds(&self) -> Refunds<'_> {
        Refunds::new(&self.client)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Stripe;
    use rstripe_http::ClientConfig;
    use wiremock::MockServer;

    /// A handle pointed at `server` with a test key.
    pub(crate) fn stripe(server: &MockServer) -> Stripe {
        let config = ClientConfig::new("sk_test_123")
            .with_base_url(&server.uri())
            .unwrap();
        Stripe::new(config).unwrap()
    }
}
