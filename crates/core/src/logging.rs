//! Structured logging infrastructure for Credroot.
//!
//! Centralized `tracing` subscriber setup with plain or JSON output. The
//! `RUST_LOG` environment variable always wins over the configured level.

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn filter_or(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize the logging system with human-readable output at `info`.
///
/// # Example
/// ```no_run
/// use credroot_core::logging;
///
/// logging::init();
/// tracing::info!("Issuer started");
/// ```
pub fn init() {
    init_with(&LoggingConfig::default());
}

/// Initialize the logging system with JSON output for log aggregation.
pub fn init_json() {
    init_with(&LoggingConfig {
        json: true,
        ..LoggingConfig::default()
    });
}

/// Initialize from a [`LoggingConfig`], writing to stderr so stdout stays
/// free for command output. Safe to call more than once; only the first call
/// installs a subscriber.
pub fn init_with(config: &LoggingConfig) {
    let filter = filter_or(&config.level);
    let result = if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()
    };

    if result.is_err() {
        tracing::debug!("Logging already initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_with_twice_does_not_panic() {
        let config = LoggingConfig::default();
        init_with(&config);
        init_with(&config);
    }

    #[test]
    fn test_plain_and_json_entry_points_share_installation() {
        init();
        init_json();
        tracing::info!("still logging after repeated init");
    }

    #[test]
    fn test_filter_accepts_configured_level() {
        let _ = filter_or("credroot_core=debug");
    }
}
