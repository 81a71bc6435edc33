//! Monitor configuration.

use super::{
    ConfigError, DEFAULT_BASELINE_FILE, DEFAULT_CHECK_INTERVAL_SECS, DEFAULT_COMMAND_TIMEOUT_SECS,
    Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Configuration for one driftwatch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Root directories walked by the filesystem scan.
    #[serde(default)]
    pub monitor_folder: Vec<PathBuf>,

    /// Extension allow-list (e.g. `".log"`). Empty allows every extension.
    #[serde(default)]
    pub file_extensions: Vec<String>,

    /// Substrings that prune any directory whose name contains them.
    #[serde(default)]
    pub ignore_files: Vec<String>,

    /// Where the baseline is persisted.
    #[serde(default = "default_baseline_file", alias = "baseline_port")]
    pub baseline_file: PathBuf,

    /// Whether the filesystem scan runs.
    #[serde(default = "default_true")]
    pub monitor_files: bool,

    /// Whether the process scan runs.
    #[serde(default)]
    pub monitor_process: bool,

    /// Whether the listening-port scan runs.
    #[serde(default)]
    pub monitor_port: bool,

    /// Closed watch list of ports.
    #[serde(default)]
    pub ports_to_monitor: Vec<u16>,

    /// Closed watch list of process names.
    #[serde(default)]
    pub process_to_monitor: Vec<String>,

    /// Seconds between the end of one scan and the start of the next.
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,

    /// Upper bound for each external enumeration command.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_baseline_file() -> PathBuf {
    PathBuf::from(DEFAULT_BASELINE_FILE)
}

fn default_check_interval_secs() -> u64 {
    DEFAULT_CHECK_INTERVAL_SECS
}

fn default_command_timeout_secs() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            monitor_folder: Vec::new(),
            file_extensions: Vec::new(),
            ignore_files: Vec::new(),
            baseline_file: default_baseline_file(),
            monitor_files: true,
            monitor_process: false,
            monitor_port: false,
            ports_to_monitor: Vec::new(),
            process_to_monitor: Vec::new(),
            check_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
        }
    }
}

impl MonitorConfig {
    /// Create a new config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read, parse and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        debug!(
            "Loaded config from {}: {} folder(s), {} port(s), {} process(es)",
            path.display(),
            config.monitor_folder.len(),
            config.ports_to_monitor.len(),
            config.process_to_monitor.len()
        );
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.check_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "check_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.command_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "command_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.ports_to_monitor.contains(&0) {
            return Err(ConfigError::Invalid(
                "ports_to_monitor must not contain port 0".to_string(),
            ));
        }
        if self.baseline_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "baseline_file must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Filesystem scan runs only with the flag set and at least one folder.
    pub fn files_enabled(&self) -> bool {
        self.monitor_files && !self.monitor_folder.is_empty()
    }

    pub fn ports_enabled(&self) -> bool {
        self.monitor_port
    }

    pub fn processes_enabled(&self) -> bool {
        self.monitor_process
    }

    /// Get the scan interval.
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// Get the enumerator command timeout.
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Builder: add a watched folder.
    pub fn folder(mut self, dir: impl Into<PathBuf>) -> Self {
        self.monitor_folder.push(dir.into());
        self
    }

    /// Builder: add an allowed extension.
    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.file_extensions.push(ext.into());
        self
    }

    /// Builder: add an ignore substring.
    pub fn ignore(mut self, pattern: impl Into<String>) -> Self {
        self.ignore_files.push(pattern.into());
        self
    }

    /// Builder: set the baseline path.
    pub fn baseline_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.baseline_file = path.into();
        self
    }

    /// Builder: enable or disable the filesystem scan.
    pub fn files(mut self, enabled: bool) -> Self {
        self.monitor_files = enabled;
        self
    }

    /// Builder: watch a port (enables the port scan).
    pub fn watch_port(mut self, port: u16) -> Self {
        self.monitor_port = true;
        self.ports_to_monitor.push(port);
        self
    }

    /// Builder: watch a process name (enables the process scan).
    pub fn watch_process(mut self, name: impl Into<String>) -> Self {
        self.monitor_process = true;
        self.process_to_monitor.push(name.into());
        self
    }

    /// Builder: set the scan interval.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.check_interval_secs = interval.as_secs();
        self
    }
}
