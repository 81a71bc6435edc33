//! Log output setup.

use crate::cli::LogLevel;
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

/// Install a stdout subscriber.
///
/// `RUST_LOG` wins when set; otherwise `DRIFTWATCH_LOG_LEVEL`, then `info`.
pub fn init() {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::new(directives),
        _ => {
            let level = std::env::var("DRIFTWATCH_LOG_LEVEL")
                .ok()
                .and_then(|v| LogLevel::from_str_loose(&v))
                .unwrap_or_default();
            EnvFilter::new(level.as_filter_str())
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_ansi(std::io::stdout().is_terminal())
        .with_target(false)
        .init();
}
