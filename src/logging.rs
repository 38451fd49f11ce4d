//! Console logging.
//!
//! Log output goes to stderr so that JSON reports on stdout stay parseable.
//! `RUST_LOG` takes precedence over the configured level.

use std::io;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub fn init_logging(level: &str, verbose: bool) {
    let level = match level {
        "trace" | "debug" | "info" | "warn" | "error" => level,
        _ => "info",
    };
    let level = if verbose { "debug" } else { level };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(io::stderr)
            .with_target(true)
            .with_level(true)
            .with_file(false)
            .with_line_number(false),
    );

    // A second init (tests, embedding) keeps the first subscriber.
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("Global subscriber already set");
    }
}
