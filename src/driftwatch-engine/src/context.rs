//! Per-run monitor state.

use crate::Result;
use driftwatch_baseline::{Baseline, BaselineStore, Domain};
use driftwatch_config::MonitorConfig;
use tracing::{error, info};

/// Config, baseline and its store for one engine instance.
#[derive(Debug)]
pub struct MonitorContext {
    config: MonitorConfig,
    store: BaselineStore,
    baseline: Baseline,
}

impl MonitorContext {
    /// Load the baseline named by `config`.
    pub async fn load(config: MonitorConfig) -> Result<Self> {
        let store = BaselineStore::new(&config.baseline_file);
        let baseline = store.load(&enabled_domains(&config)).await?;
        Ok(Self::new(config, store, baseline))
    }

    pub fn new(config: MonitorConfig, store: BaselineStore, baseline: Baseline) -> Self {
        Self {
            config,
            store,
            baseline,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    pub fn store(&self) -> &BaselineStore {
        &self.store
    }

    /// Domains the config turns on, in scan order.
    pub fn enabled_domains(&self) -> Vec<Domain> {
        enabled_domains(&self.config)
    }

    /// Record an approval and persist the whole baseline.
    ///
    /// The approval stands in memory even if the save fails; the failure is
    /// logged and reported as `false`.
    pub async fn approve(&mut self, domain: Domain, key: &str) -> bool {
        self.baseline.approve(domain, key);
        match self.store.save(&self.baseline).await {
            Ok(()) => true,
            Err(e) => {
                error!("Unable to save baseline file: {}", e);
                false
            }
        }
    }

    /// Log a one-line summary of the loaded state.
    pub fn log_summary(&self) {
        info!(
            "Baseline {}: {} file(s), {} port(s), {} process(es) approved",
            self.store.path().display(),
            self.baseline.len(Domain::Files),
            self.baseline.len(Domain::Ports),
            self.baseline.len(Domain::Processes)
        );
    }
}

fn enabled_domains(config: &MonitorConfig) -> Vec<Domain> {
    let mut domains = Vec::new();
    if config.files_enabled() {
        domains.push(Domain::Files);
    }
    if config.ports_enabled() {
        domains.push(Domain::Ports);
    }
    if config.processes_enabled() {
        domains.push(Domain::Processes);
    }
    domains
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_creates_maps_for_enabled_domains() {
        let dir = tempdir().unwrap();
        let config = MonitorConfig::new()
            .baseline_path(dir.path().join("b.json"))
            .watch_port(22);
        let ctx = MonitorContext::load(config).await.unwrap();
        assert_eq!(ctx.enabled_domains(), vec![Domain::Ports]);
        assert!(ctx.baseline().known_ports.is_some());
        assert!(ctx.baseline().known_files.is_none());
    }

    #[tokio::test]
    async fn test_approve_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("b.json");
        let config = MonitorConfig::new().baseline_path(&path).watch_process("sshd");
        let mut ctx = MonitorContext::load(config).await.unwrap();

        assert!(ctx.approve(Domain::Processes, "sshd").await);
        let reloaded = BaselineStore::new(&path).load(&[]).await.unwrap();
        assert!(reloaded.contains(Domain::Processes, "sshd"));
    }

    #[tokio::test]
    async fn test_failed_save_keeps_approval_in_memory() {
        let dir = tempdir().unwrap();
        // A directory where the file should be makes the rename fail.
        let path = dir.path().join("b.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupied"), "x").unwrap();

        let config = MonitorConfig::new().watch_process("sshd");
        let mut ctx = MonitorContext::new(
            config,
            BaselineStore::new(&path),
            Baseline::empty_for(&[Domain::Processes]),
        );
        assert!(!ctx.approve(Domain::Processes, "sshd").await);
        assert!(ctx.baseline().contains(Domain::Processes, "sshd"));
    }
}
