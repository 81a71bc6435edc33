//! Monitor configuration for driftwatch.
//!
//! The configuration is a single JSON document loaded once at startup and
//! treated as read-only afterwards. Every field is optional on disk; absent
//! fields fall back to the defaults in [`MonitorConfig::default`].
//!
//! # Example
//!
//! ```json
//! {
//!   "monitor_folder": ["/srv/www"],
//!   "file_extensions": [".html", ".css"],
//!   "ignore_files": ["cache"],
//!   "baseline_file": "/var/lib/driftwatch/baseline.json",
//!   "monitor_port": true,
//!   "ports_to_monitor": [80, 443],
//!   "monitor_process": true,
//!   "process_to_monitor": ["nginx", "sshd"]
//! }
//! ```

pub mod config;

pub use config::MonitorConfig;

use std::path::PathBuf;
use thiserror::Error;

/// Baseline file used when the config does not name one.
pub const DEFAULT_BASELINE_FILE: &str = "baseline.json";

/// Default scan interval in seconds.
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;

/// Default timeout for a single enumerator shell-out, in seconds.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

/// Errors for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("unable to open config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for the schema.
    #[error("unable to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Config parsed but holds contradictory values.
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
