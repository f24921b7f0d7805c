//! Logging initialization.

use tracing::Level;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Parse log level string to tracing Level.
fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Initialize stderr logging. `debug` raises the level to at least DEBUG;
/// `RUST_LOG` directives refine it further.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(level: &str, debug: bool) {
    let level = if debug {
        parse_level(level).max(Level::DEBUG)
    } else {
        parse_level(level)
    };
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .try_init();
}
