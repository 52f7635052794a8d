//! Tracing subscriber setup
//!
//! Log lines go to stderr; stdout carries the CSV report.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Env var holding the log filter directive (e.g. `zen_ledger=debug`)
pub const LOG_ENV_VAR: &str = "ZEN_LEDGER_LOG";

/// Install the global subscriber
///
/// `ZEN_LEDGER_LOG` wins over `default_level`. Calling this twice is harmless;
/// the second install is ignored.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
