//! Persisted baseline of approved host entities.
//!
//! A baseline holds one map per [`Domain`] from canonical entity key to an
//! "approved" flag. It is the only state driftwatch carries across restarts:
//! a key present with `true` has been approved by an operator, anything else
//! is unknown. Keys are only ever added.

pub mod baseline;
pub mod storage;

pub use baseline::{Baseline, Domain};
pub use storage::BaselineStore;

use std::path::PathBuf;
use thiserror::Error;

/// Errors for baseline persistence.
#[derive(Debug, Error)]
pub enum BaselineError {
    /// Baseline file exists but could not be read.
    #[error("unable to read baseline file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Baseline file exists but is not a valid baseline document.
    #[error("unable to parse baseline file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Baseline could not be serialized.
    #[error("unable to marshal baseline: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Baseline could not be written.
    #[error("unable to write baseline file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, BaselineError>;
