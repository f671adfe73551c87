//! Wire constants for the remote payment API.

/// Default API host.
pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 80;

/// Default bound on requests in flight per client.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;

/// Header making a POST safe to replay.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Header selecting the connected account a call acts for.
pub const STRIPE_ACCOUNT_HEADER: &str = "Stripe-Account";

/// Header pinning the API version.
pub const STRIPE_VERSION_HEADER: &str = "Stripe-Version";

/// Content type of POST bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// `User-Agent` sent when the configuration does not override it.
pub const USER_AGENT: &str = concat!("rstripe/", env!("CARGO_PKG_VERSION"));

/// Environment variable holding the secret API key.
pub const ENV_API_KEY: &str = "STRIPE_API_KEY";

/// Environment variable overriding the API host.
pub const ENV_API_BASE: &str = "STRIPE_API_BASE";

/// Environment variable overriding the timeout, in whole seconds.
pub const ENV_TIMEOUT_SECS: &str = "STRIPE_TIMEOUT_SECS";

/// Environment variable pinning the API version.
pub const ENV_API_VERSION: &str = "STRIPE_API_VERSION";
