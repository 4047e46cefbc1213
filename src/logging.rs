//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

pub const LOG_ENV: &str = "LINECOUNT_LOG";

/// Initialize logging to stderr, keeping stdout for the measurements.
///
/// Reads the filter from `LINECOUNT_LOG`, e.g.
/// `LINECOUNT_LOG=linecount_bench=debug`. Falls back to
/// `linecount_bench=info` if unset or invalid. Calling it more than once is
/// a no-op.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new("linecount_bench=info"));

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(filter)
            .init();
    });
}
