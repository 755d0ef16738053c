//! Logging setup for the command-line entry point.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Builds the filter directive used when `RUST_LOG` is not set.
pub fn default_directive(level: &str) -> String {
    format!(
        "arbor={level},arbor_import={level},arbor_persistence={level}",
        level = level.to_lowercase()
    )
}

/// Initializes logging to stderr so stdout stays free for results.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
