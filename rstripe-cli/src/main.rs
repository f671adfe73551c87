//! Command-line client for the payment API.
//!
//! # Usage
//!
//! ```bash
//! # Raw calls with bracketed form parameters
//! rstripe post /customers -p email=a@b.com -p metadata[plan]=gold
//! rstripe get /charges -p limit=3
//!
//! # Typed resource calls
//! rstripe customers retrieve cus_123
//! rstripe charges list --limit 10
//!
//! # Offline schema checks
//! rstripe validate deleted '{"id": "cus_1", "deleted": "true"}'
//!
//! # Configure logging level
//! RUST_LOG=debug rstripe balance
//! ```
//!
//! # Environment Variables
//!
//! - `RSTRIPE_CONFIG` - Path to TOML configuration file (default: `rstripe.toml`)
//! - `STRIPE_API_KEY` - Secret API key
//! - `STRIPE_API_BASE` - API host (default: `https://api.stripe.com`)
//! - `STRIPE_TIMEOUT_SECS` - Request timeout, `0` to disable (default: `80`)
//! - `STRIPE_API_VERSION` - API version header
//! - `RUST_LOG` - Log level filter (default: `info`)
//!
//! A `.env` file in the working directory is loaded first.

mod cli;
mod commands;
mod config;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays valid JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = commands::run(cli, &mut stdout).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
