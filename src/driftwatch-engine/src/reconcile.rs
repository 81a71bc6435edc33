//! Reconciliation engine.
//!
//! One [`Reconciler::tick`] enumerates every enabled domain, drops what the
//! normalization policy filters out, compares the rest with the baseline and
//! asks the approval source about anything new. Approvals are persisted one
//! by one as they happen.
//!
//! Remediation differs per domain: a rejected file is deleted, a rejected
//! port or process is only logged.

use crate::approval::{ApprovalRequest, ApprovalSource, RequestKind};
use crate::context::MonitorContext;
use crate::normalize::{
    FilePolicy, FileVerdict, file_key, normalize_process_name, port_key, port_watch_list,
    process_watch_list,
};
use crate::{EngineError, Result};
use driftwatch_baseline::{Baseline, Domain};
use driftwatch_enumerate::{Enumerator, FsVisit};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Counters for one domain pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainReport {
    /// Entities that reached the baseline comparison.
    pub evaluated: usize,
    /// Entities already approved.
    pub known: usize,
    /// Baseline keys of the already approved entities, in check order.
    pub known_keys: Vec<String>,
    pub prompted: usize,
    pub approved: usize,
    pub rejected: usize,
    /// Files deleted after rejection.
    pub removed: usize,
    /// Visit, delete and save failures that did not stop the pass.
    pub errors: usize,
}

/// Result of one full tick.
#[derive(Debug, Default)]
pub struct TickReport {
    pub files: Option<DomainReport>,
    pub ports: Option<DomainReport>,
    pub processes: Option<DomainReport>,
    /// Domains whose pass was aborted, with the reason.
    pub failures: Vec<(Domain, String)>,
}

impl TickReport {
    pub fn domain(&self, domain: Domain) -> Option<&DomainReport> {
        match domain {
            Domain::Files => self.files.as_ref(),
            Domain::Ports => self.ports.as_ref(),
            Domain::Processes => self.processes.as_ref(),
        }
    }

    /// Prompts issued across all domains.
    pub fn prompted(&self) -> usize {
        Domain::ALL
            .iter()
            .filter_map(|d| self.domain(*d))
            .map(|r| r.prompted)
            .sum()
    }

    fn record(&mut self, domain: Domain, result: Result<DomainReport>) {
        match result {
            Ok(report) => {
                if report.prompted == 0 {
                    info!("No new {} found.", plural(domain));
                }
                let slot = match domain {
                    Domain::Files => &mut self.files,
                    Domain::Ports => &mut self.ports,
                    Domain::Processes => &mut self.processes,
                };
                *slot = Some(report);
            }
            Err(e) => {
                error!("Skipping {} check this round: {}", domain, e);
                self.failures.push((domain, e.to_string()));
            }
        }
    }
}

/// Drives reconciliation for one monitor context.
pub struct Reconciler {
    ctx: MonitorContext,
    enumerator: Arc<dyn Enumerator>,
    approvals: Box<dyn ApprovalSource>,
    file_policy: FilePolicy,
}

impl Reconciler {
    pub fn new(
        ctx: MonitorContext,
        enumerator: Arc<dyn Enumerator>,
        approvals: Box<dyn ApprovalSource>,
    ) -> Self {
        let file_policy = FilePolicy::from_config(ctx.config());
        Self {
            ctx,
            enumerator,
            approvals,
            file_policy,
        }
    }

    pub fn context(&self) -> &MonitorContext {
        &self.ctx
    }

    pub fn baseline(&self) -> &Baseline {
        self.ctx.baseline()
    }

    /// Run every enabled domain once.
    ///
    /// A failing domain is logged and skipped; the others still run.
    pub async fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        for domain in self.ctx.enabled_domains() {
            let result = match domain {
                Domain::Files => Ok(self.check_files().await),
                Domain::Ports => self.check_ports().await,
                Domain::Processes => self.check_processes().await,
            };
            report.record(domain, result);
        }
        report
    }

    /// Walk every watched folder.
    pub async fn check_files(&mut self) -> DomainReport {
        info!("Checking files...");
        let mut report = DomainReport::default();
        let roots = self.ctx.config().monitor_folder.clone();

        for root in roots {
            let visits = self.enumerator.list_files(&root, &self.file_policy);
            for visit in visits {
                match visit {
                    FsVisit::Error { path, message } => {
                        let shown = path
                            .as_deref()
                            .map(|p| p.display().to_string())
                            .unwrap_or_else(|| root.display().to_string());
                        warn!("Cannot access {}: {}", shown, message);
                        report.errors += 1;
                    }
                    FsVisit::Pruned(dir) => {
                        debug!("Ignoring directory {}", dir.display());
                    }
                    FsVisit::File(path) => self.evaluate_file(&path, &mut report).await,
                }
            }
        }
        report
    }

    async fn evaluate_file(&mut self, path: &Path, report: &mut DomainReport) {
        report.evaluated += 1;
        let key = file_key(path);

        let request = match self.file_policy.classify(path, self.ctx.baseline()) {
            FileVerdict::Known => {
                report.known += 1;
                report.known_keys.push(key);
                return;
            }
            FileVerdict::Quarantine { extension } => {
                warn!(
                    "File {} has extension '{}' not listed in file_extensions",
                    key, extension
                );
                ApprovalRequest::new(
                    Domain::Files,
                    RequestKind::Quarantine,
                    &key,
                    format!("Detect file with unlisted extension '{}': {}", extension, key),
                )
            }
            FileVerdict::Novel => ApprovalRequest::new(
                Domain::Files,
                RequestKind::Novel,
                &key,
                format!("Detect new files {}", key),
            ),
        };

        report.prompted += 1;
        if self.approvals.decide(&request).await.is_approved() {
            report.approved += 1;
            if self.ctx.approve(Domain::Files, &key).await {
                info!("Approved and saved baseline file: {}", key);
            } else {
                report.errors += 1;
            }
            return;
        }

        report.rejected += 1;
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                report.removed += 1;
                match request.kind {
                    RequestKind::Quarantine => {
                        info!("Removed quarantined file: {}", key)
                    }
                    RequestKind::Novel => info!("Removed file: {}", key),
                }
            }
            Err(e) => {
                error!("Unable to remove {}: {}", key, e);
                report.errors += 1;
            }
        }
    }

    /// Compare watched ports with what is listening now.
    pub async fn check_ports(&mut self) -> Result<DomainReport> {
        info!("Checking ports...");
        let mut report = DomainReport::default();
        let watched = port_watch_list(self.ctx.config());
        if watched.is_empty() {
            debug!("No ports to monitor");
            return Ok(report);
        }

        let listening = self
            .enumerator
            .list_ports()
            .await
            .map_err(|source| EngineError::Enumerate {
                domain: Domain::Ports,
                source,
            })?;

        for port in watched {
            let Some(process) = listening.get(&port) else {
                debug!("Monitored port {} is not listening", port);
                continue;
            };
            report.evaluated += 1;
            let key = port_key(port, process);

            if self.ctx.baseline().contains(Domain::Ports, &key) {
                report.known += 1;
                info!("Approved port {} is being used by process: {}", port, process);
                report.known_keys.push(key);
                continue;
            }

            warn!("ALERT: Monitored port {} is being used by process: {}", port, process);
            let request = ApprovalRequest::new(
                Domain::Ports,
                RequestKind::Novel,
                &key,
                format!("Detected port {} is being used by process: {}", port, process),
            );
            report.prompted += 1;
            if self.approvals.decide(&request).await.is_approved() {
                report.approved += 1;
                if self.ctx.approve(Domain::Ports, &key).await {
                    info!("Port {} with process {} added to baseline", port, process);
                } else {
                    report.errors += 1;
                }
            } else {
                report.rejected += 1;
                warn!("Port {} with process {} is NOT approved", port, process);
            }
        }
        Ok(report)
    }

    /// Compare watched process names with what is running now.
    pub async fn check_processes(&mut self) -> Result<DomainReport> {
        info!("Checking processes...");
        let mut report = DomainReport::default();
        let watched = process_watch_list(self.ctx.config());
        if watched.is_empty() {
            debug!("No processes to monitor");
            return Ok(report);
        }

        let raw = self
            .enumerator
            .list_processes()
            .await
            .map_err(|source| EngineError::Enumerate {
                domain: Domain::Processes,
                source,
            })?;

        // normalized name -> first raw name observed
        let mut running: HashMap<String, String> = HashMap::new();
        for name in raw {
            running.entry(normalize_process_name(&name)).or_insert(name);
        }

        for name in watched {
            let Some(observed) = running.get(&name) else {
                debug!("Monitored process {} is not running", name);
                continue;
            };
            report.evaluated += 1;

            if self.ctx.baseline().contains(Domain::Processes, &name) {
                report.known += 1;
                info!("Process {} is approved, already running", name);
                report.known_keys.push(name);
                continue;
            }

            warn!("ALERT: Monitored process {} is running but not approved", observed);
            let request = ApprovalRequest::new(
                Domain::Processes,
                RequestKind::Novel,
                &name,
                format!("Detect new process {}", observed),
            );
            report.prompted += 1;
            if self.approvals.decide(&request).await.is_approved() {
                report.approved += 1;
                if self.ctx.approve(Domain::Processes, &name).await {
                    info!("Process {} added to baseline", name);
                } else {
                    report.errors += 1;
                }
            } else {
                report.rejected += 1;
                warn!("Unapproved process detected: {}", observed);
            }
        }
        Ok(report)
    }
}

fn plural(domain: Domain) -> &'static str {
    match domain {
        Domain::Files => "files",
        Domain::Ports => "ports",
        Domain::Processes => "processes",
    }
}
