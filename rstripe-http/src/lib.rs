#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP request pipeline for the rstripe payment API client.
//!
//! Turns a path (or an [`Operation`](rstripe::Operation)) plus
//! [`RequestOptions`](rstripe::RequestOptions) into an authenticated,
//! form-encoded request, dispatches it without blocking the caller and
//! classifies the response into a success value, an API error or a
//! transport error.
//!
//! # Modules
//!
//! - [`client`] - The [`Client`] and response classification
//! - [`config`] - Immutable client defaults ([`ClientConfig`]), loadable from the environment
//! - [`encoding`] - Bracketed `key[sub][0]=value` form encoding
//! - [`constants`] - Default host, header names, environment variable names
//!
//! # Example
//!
//! ```rust,no_run
//! use rstripe::RequestOptions;
//! use rstripe_http::{Client, ClientConfig};
//!
//! # async fn demo() -> Result<(), rstripe::Error> {
//! let client = Client::new(ClientConfig::new("sk_test_123"))?;
//! let balance = client.get("balance", RequestOptions::new())?.await?;
//! println!("{balance}");
//! # Ok(())
//! # }
//! ```
//!
//! # Feature Flags
//!
//! - `telemetry` (default) - Emits `tracing` spans and events for every request

pub mod client;
pub mod config;
pub mod constants;
pub mod encoding;

pub use client::{Client, classify};
pub use config::ClientConfig;
