//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;

/// Usage line printed when no config file is given.
pub const USAGE: &str = "Usage: driftwatch <config_file>";

/// Host drift detection with interactive approval.
///
/// Scans watched folders, listening ports and running processes against an
/// approved baseline and asks before accepting anything new.
#[derive(Debug, Parser)]
#[command(name = "driftwatch", version, about)]
pub struct Cli {
    /// Path to the JSON config file.
    pub config: Option<PathBuf>,
}

/// Log verbosity, read from `DRIFTWATCH_LOG_LEVEL`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<LogLevel> {
        match s.trim().to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}
