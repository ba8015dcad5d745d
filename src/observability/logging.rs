//! Structured logging setup.
//!
//! # Responsibilities
//! - Install a `tracing` subscriber for processes embedding the registry
//! - Honour `RUST_LOG`, falling back to a crate-scoped default filter

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "config_registry=info";

/// Build the filter from `RUST_LOG`, or from `fallback` when the variable is unusable.
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install the global subscriber.
///
/// Returns `false` when another subscriber is already installed, which is
/// common in tests.
pub fn init() -> bool {
    tracing_subscriber::registry()
        .with(env_filter(DEFAULT_FILTER))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_does_not_panic() {
        init();
        assert!(!init());
    }
}
