//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::error::CliError;

/// Call the payment API from the command line.
#[derive(Debug, Parser)]
#[command(name = "rstripe", version, about)]
pub struct Cli {
    /// TOML configuration file [env: RSTRIPE_CONFIG, default: rstripe.toml]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Secret API key, overriding the file and STRIPE_API_KEY.
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// API host, overriding the file and STRIPE_API_BASE.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Act on behalf of a connected account.
    #[arg(long, global = true)]
    pub stripe_account: Option<String>,

    /// Print results as single-line JSON.
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// GET a raw API path.
    Get(RawCall),

    /// POST to a raw API path.
    Post {
        #[command(flatten)]
        call: RawCall,

        /// Key making the request safe to retry.
        #[arg(long)]
        idempotency_key: Option<String>,
    },

    /// DELETE a raw API path.
    Delete(RawCall),

    /// Show the account balance.
    Balance,

    /// Typed resource operations.
    #[command(flatten)]
    Resource(ResourceCommand),

    /// Check a JSON document against a registered schema.
    Validate {
        /// Schema name, e.g. `account` or `charge_list`.
        schema: String,

        /// JSON document.
        json: String,
    },

    /// List the registered schema names.
    Schemas,
}

/// Raw path plus form-style parameters.
#[derive(Debug, Args)]
pub struct RawCall {
    /// Path below the API version prefix, e.g. `/customers`.
    pub path: String,

    /// Parameter in bracketed form, e.g. `-p metadata[plan]=gold`.
    #[arg(short = 'p', long = "param", value_parser = parse_param)]
    pub params: Vec<(String, String)>,
}

#[derive(Debug, Subcommand)]
pub enum ResourceCommand {
    /// Connected accounts.
    #[command(subcommand)]
    Accounts(ResourceAction),

    /// Charges.
    #[command(subcommand)]
    Charges(ResourceAction),

    /// Customers.
    #[command(subcommand)]
    Customers(ResourceAction),

    /// Refunds.
    #[command(subcommand)]
    Refunds(ResourceAction),
}

#[derive(Debug, Subcommand)]
pub enum ResourceAction {
    /// Fetch one object by id.
    Retrieve {
        /// Object id.
        id: String,
    },

    /// Fetch one page of objects.
    List {
        /// Page size, 1 to 100.
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..=100))]
        limit: Option<u64>,

        /// Return objects after this id.
        #[arg(long)]
        starting_after: Option<String>,
    },
}

fn parse_param(raw: &str) -> Result<(String, String), CliError> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_owned(), value.to_owned()))
        .ok_or_else(|| CliError::Param(raw.to_owned()))
}
