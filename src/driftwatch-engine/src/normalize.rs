//! Normalization policy: raw records to canonical entity keys.
//!
//! Every function here is deterministic and idempotent, so the same host
//! entity maps to the same baseline key on every scan.

use driftwatch_baseline::{Baseline, Domain};
use driftwatch_config::MonitorConfig;
use driftwatch_enumerate::DirFilter;
use std::collections::HashSet;
use std::path::Path;

/// Executable suffix stripped from process names.
pub const EXECUTABLE_SUFFIX: &str = ".exe";

/// How a visited file is handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileVerdict {
    /// Already approved; never re-evaluated.
    Known,
    /// Extension outside the allow-list.
    Quarantine { extension: String },
    /// Unknown file with an acceptable extension.
    Novel,
}

/// Filesystem filters derived from the config.
#[derive(Debug, Clone, Default)]
pub struct FilePolicy {
    ignore: Vec<String>,
    extensions: Vec<String>,
}

impl FilePolicy {
    pub fn new(ignore: Vec<String>, extensions: Vec<String>) -> Self {
        let extensions = extensions
            .iter()
            .map(|e| e.trim())
            .filter(|e| !e.is_empty())
            .map(|e| {
                let lower = e.to_lowercase();
                if lower.starts_with('.') {
                    lower
                } else {
                    format!(".{lower}")
                }
            })
            .collect();
        let ignore = ignore.into_iter().filter(|s| !s.is_empty()).collect();
        Self { ignore, extensions }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.ignore_files.clone(), config.file_extensions.clone())
    }

    /// Whether a directory name matches any ignore substring.
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignore.iter().any(|pattern| name.contains(pattern.as_str()))
    }

    /// Whether `path` passes the extension allow-list.
    pub fn extension_allowed(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let ext = file_extension(path).to_lowercase();
        self.extensions.iter().any(|allowed| *allowed == ext)
    }

    /// Classify a visited file against the baseline.
    pub fn classify(&self, path: &Path, baseline: &Baseline) -> FileVerdict {
        if baseline.contains(Domain::Files, &file_key(path)) {
            return FileVerdict::Known;
        }
        if !self.extension_allowed(path) {
            return FileVerdict::Quarantine {
                extension: file_extension(path).to_string(),
            };
        }
        FileVerdict::Novel
    }
}

impl DirFilter for FilePolicy {
    fn prune(&self, dir_name: &str) -> bool {
        self.is_ignored(dir_name)
    }
}

/// Baseline key for a file.
pub fn file_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Suffix of the file name from its last dot, dot included; empty if none.
///
/// A dotfile such as `.bashrc` is its own extension.
pub fn file_extension(path: &Path) -> &str {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return "";
    };
    match name.rfind('.') {
        Some(idx) => &name[idx..],
        None => "",
    }
}

/// Canonical process name: trimmed, lowercase, without `.exe`.
pub fn normalize_process_name(raw: &str) -> String {
    strip_executable_suffix(&raw.trim().to_lowercase()).to_string()
}

/// Process name as bound into a port key: trimmed, without `.exe`, case kept.
pub fn normalize_port_process(raw: &str) -> String {
    strip_executable_suffix(raw.trim()).to_string()
}

/// Remove every trailing `.exe` (any case) but never the whole name.
fn strip_executable_suffix(name: &str) -> &str {
    let mut name = name;
    loop {
        let cut = name.len().saturating_sub(EXECUTABLE_SUFFIX.len());
        if cut == 0
            || !name.is_char_boundary(cut)
            || !name[cut..].eq_ignore_ascii_case(EXECUTABLE_SUFFIX)
        {
            return name;
        }
        name = &name[..cut];
    }
}

/// Baseline key binding a port to its owning process.
pub fn port_key(port: u16, process: &str) -> String {
    format!("{}:{}", port, normalize_port_process(process))
}

/// Configured ports, deduplicated, in config order.
pub fn port_watch_list(config: &MonitorConfig) -> Vec<u16> {
    let mut seen = HashSet::new();
    config
        .ports_to_monitor
        .iter()
        .copied()
        .filter(|port| seen.insert(*port))
        .collect()
}

/// Configured process names, normalized and deduplicated, in config order.
pub fn process_watch_list(config: &MonitorConfig) -> Vec<String> {
    let mut seen = HashSet::new();
    config
        .process_to_monitor
        .iter()
        .map(|name| normalize_process_name(name))
        .filter(|name| !name.is_empty() && seen.insert(name.clone()))
        .collect()
}
