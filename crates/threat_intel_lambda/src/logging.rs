//! Tracing setup for the Lambda binary.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// `RUST_LOG` wins when it parses; otherwise `fallback` applies.
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// Installs a JSON subscriber on stdout for CloudWatch.
///
/// CloudWatch stamps every line itself, so the subscriber's own timestamp
/// and ANSI colours are turned off. Returns an error when a global
/// subscriber is already set.
pub fn init(fallback: &str) -> Result<(), String> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter(fallback))
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .with_current_span(false)
        .try_init()
        .map_err(|error| format!("failed to set subscriber: {error}"))
}
