//! Tracing setup for the binary
//!
//! `RUST_LOG` wins when set; otherwise the configured filter applies. Output
//! goes to stderr so stdout stays clean for command results.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
