//! Tracing/logging initialization.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise the global tracing subscriber.
///
/// `default_filter` is the filter used when `RUST_LOG` is not set
/// (e.g. `"wirepipe=info"`).
pub fn init_tracing(default_filter: &str) {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
    );
    // stdout carries forwarded payload bytes; log lines go to stderr.
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
