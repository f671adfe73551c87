//! Command execution.

use std::io::Write;

use rstripe::{PendingResult, RequestOptions};
use rstripe_http::ClientConfig;
use rstripe_http::encoding::unflatten;
use rstripe_resources::{Stripe, registry};
use serde_json::Value;

use crate::cli::{Cli, Command, RawCall, ResourceAction, ResourceCommand};
use crate::config::CliConfig;
use crate::error::CliError;

/// Runs `cli`, writing results to `out`.
///
/// # Errors
///
/// Returns [`CliError`] if configuration, the call or the output fails.
pub async fn run(cli: Cli, out: &mut impl Write) -> Result<(), CliError> {
    let compact = cli.compact;
    match cli.command {
        Command::Validate { schema, json } => validate(&schema, &json, compact, out),
        Command::Schemas => {
            let mut names: Vec<&str> = registry().names().collect();
            names.sort_unstable();
            for name in names {
                writeln!(out, "{name}")?;
            }
            Ok(())
        }
        command => {
            let file = CliConfig::load(cli.config.as_deref())?;
            let config = client_config(&file, cli.api_key, cli.base_url.as_deref(), |var| {
                std::env::var(var).ok()
            })?;
            tracing::debug!(?config, "resolved client configuration");
            let stripe = Stripe::new(config)?;
            let mut base = RequestOptions::new();
            base.stripe_account = cli.stripe_account;
            let value = call(&stripe, command, base)?.await?;
            write_json(out, &value, compact)
        }
    }
}

/// Layers command-line flags over the file and environment.
fn client_config(
    file: &CliConfig,
    api_key: Option<String>,
    base_url: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientConfig, CliError> {
    let mut config = file.resolve(env)?;
    if let Some(api_key) = api_key {
        config = config.with_api_key(api_key);
    }
    if let Some(base_url) = base_url {
        config = config.with_base_url(base_url)?;
    }
    Ok(config)
}

/// Starts the call a networked command maps to.
fn call(stripe: &Stripe, command: Command, base: RequestOptions) -> Result<PendingResult, CliError> {
    let pending = match command {
        Command::Get(call) => {
            let (path, options) = raw(call, base);
            stripe.client().get(&path, options)?
        }
        Command::Post {
            call,
            idempotency_key,
        } => {
            let (path, mut options) = raw(call, base);
            options.idempotency_key = idempotency_key;
            stripe.client().post(&path, options)?
        }
        Command::Delete(call) => {
            let (path, options) = raw(call, base);
            stripe.client().delete(&path, options)?
        }
        Command::Balance => stripe.balance().retrieve(base)?,
        Command::Resource(resource) => dispatch(stripe, resource, base)?,
        Command::Validate { .. } => return Err(CliError::Offline("validate")),
        Command::Schemas => return Err(CliError::Offline("schemas")),
    };
    Ok(pending)
}

fn raw(call: RawCall, base: RequestOptions) -> (String, RequestOptions) {
    (call.path, base.with_params(unflatten(call.params)))
}

fn dispatch(
    stripe: &Stripe,
    resource: ResourceCommand,
    base: RequestOptions,
) -> Result<PendingResult, rstripe::Error> {
    match resource {
        ResourceCommand::Accounts(action) => match action {
            ResourceAction::Retrieve { id } => stripe.accounts().retrieve(&id, base),
            list => stripe.accounts().list(list_options(list, base)),
        },
        ResourceCommand::Charges(action) => match action {
            ResourceAction::Retrieve { id } => stripe.charges().retrieve(&id, base),
            list => stripe.charges().list(list_options(list, base)),
        },
        ResourceCommand::Customers(action) => match action {
            ResourceAction::Retrieve { id } => stripe.customers().retrieve(&id, base),
            list => stripe.customers().list(list_options(list, base)),
        },
        ResourceCommand::Refunds(action) => match action {
            ResourceAction::Retrieve { id } => stripe.refunds().retrieve(&id, base),
            list => stripe.refunds().list(list_options(list, base)),
        },
    }
}

fn list_options(action: ResourceAction, mut options: RequestOptions) -> RequestOptions {
    if let ResourceAction::List {
        limit,
        starting_after,
    } = action
    {
        if let Some(limit) = limit {
            options = options.param("limit", limit);
        }
        if let Some(starting_after) = starting_after {
            options = options.param("starting_after", starting_after);
        }
    }
    options
}

fn validate(schema: &str, json: &str, compact: bool, out: &mut impl Write) -> Result<(), CliError> {
    let value: Value = serde_json::from_str(json)?;
    let violations = registry().explain(schema, &value);
    if violations.is_empty() {
        return write_json(out, &value, compact);
    }
    for violation in &violations {
        writeln!(out, "{violation}")?;
    }
    Err(CliError::Invalid {
        schema: schema.to_owned(),
        count: violations.len(),
    })
}

fn write_json(out: &mut impl Write, value: &Value, compact: bool) -> Result<(), CliError> {
    if compact {
        serde_json::to_writer(&mut *out, value)?;
    } else {
        serde_json::to_writer_pretty(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}
