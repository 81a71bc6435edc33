//! Baseline reconciliation engine for driftwatch.
//!
//! # Architecture
//!
//! ```text
//! Scheduler ──tick──▶ Reconciler ──▶ Enumerator      (current host state)
//!                        │      ──▶ normalize        (keys, filters)
//!                        │      ──▶ ApprovalSource   (y/n per new entity)
//!                        ▼
//!                  MonitorContext ──▶ BaselineStore  (save after each approval)
//! ```
//!
//! A [`MonitorContext`] is built once per run and owned by the
//! [`Reconciler`]; nothing is global, so several engines can coexist in one
//! process.

pub mod approval;
pub mod context;
pub mod normalize;
pub mod reconcile;
pub mod scheduler;
pub mod stdin;

pub use approval::{
    ApprovalRequest, ApprovalSource, Decision, PromptApproval, RequestKind, ScriptedApproval,
};
pub use context::MonitorContext;
pub use normalize::{FilePolicy, FileVerdict};
pub use reconcile::{DomainReport, Reconciler, TickReport};
pub use scheduler::{Scheduler, TickOutcome};
pub use stdin::{ChannelReader, spawn_stdin_reader};

use driftwatch_baseline::{BaselineError, Domain};
use driftwatch_enumerate::EnumerateError;
use thiserror::Error;

/// Errors for the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Baseline could not be loaded.
    #[error(transparent)]
    Baseline(#[from] BaselineError),

    /// Current state of a domain could not be enumerated.
    #[error("unable to enumerate {domain} state: {source}")]
    Enumerate {
        domain: Domain,
        #[source]
        source: EnumerateError,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
