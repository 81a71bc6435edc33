//! Host state enumeration for driftwatch.
//!
//! Everything that touches the operating system to discover current state
//! lives behind the [`Enumerator`] trait:
//!
//! - walking watched directory trees ([`walk`])
//! - mapping listening ports to owning processes ([`ports`])
//! - listing running process names ([`process`])
//!
//! The text produced by `ps`, `lsof`, `tasklist` and `netstat` is parsed by
//! pure functions so the fragile parts can be tested on captured output.
//! [`system_enumerator`] picks the implementation for the current platform.

pub mod command;
pub mod ports;
pub mod process;
pub mod snapshot;
pub mod system;
pub mod walk;

pub use snapshot::StaticEnumerator;
pub use system::{UnixEnumerator, WindowsEnumerator, system_enumerator};
pub use walk::{DirFilter, FsVisit, walk_tree};

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Listening ports mapped to the name of the owning process.
pub type PortMap = BTreeMap<u16, String>;

/// Source of current host state.
#[async_trait]
pub trait Enumerator: Send + Sync {
    /// Walk `root`, skipping directories `filter` prunes. Never fails as a
    /// whole; unreadable nodes come back as [`FsVisit::Error`].
    fn list_files(&self, root: &Path, filter: &dyn DirFilter) -> Vec<FsVisit> {
        walk_tree(root, filter)
    }

    /// Current listening ports and their processes.
    async fn list_ports(&self) -> Result<PortMap>;

    /// Raw names of currently running processes.
    async fn list_processes(&self) -> Result<Vec<String>>;
}

/// Errors from enumeration backends.
#[derive(Debug, Error)]
pub enum EnumerateError {
    /// Command could not be started.
    #[error("unable to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Command ran but reported failure.
    #[error("'{command}' exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    /// Command did not finish in time.
    #[error("'{command}' timed out after {timeout_secs}s")]
    Timeout { command: String, timeout_secs: u64 },

    /// Command output did not have the expected shape.
    #[error("unparseable output from '{command}': {reason}")]
    Parse { command: String, reason: String },
}

pub type Result<T> = std::result::Result<T, EnumerateError>;
