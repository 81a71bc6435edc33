//! Fixed-interval scheduler with single-flight ticks.

use crate::reconcile::{Reconciler, TickReport};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// What happened to a trigger.
#[derive(Debug)]
pub enum TickOutcome {
    /// A tick ran to completion.
    Completed(TickReport),
    /// Another tick was still in flight; this trigger was dropped.
    Skipped,
}

impl TickOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, TickOutcome::Skipped)
    }
}

/// Runs the reconciler now and then every `interval` after the previous
/// tick finished.
///
/// At most one tick runs at a time no matter how many handles trigger it.
#[derive(Clone)]
pub struct Scheduler {
    reconciler: Arc<Mutex<Reconciler>>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(reconciler: Reconciler, interval: Duration) -> Self {
        Self {
            reconciler: Arc::new(Mutex::new(reconciler)),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one tick unless one is already in flight.
    pub async fn trigger(&self) -> TickOutcome {
        let Ok(mut reconciler) = self.reconciler.try_lock() else {
            warn!("Previous check is still running, skipping this one");
            return TickOutcome::Skipped;
        };
        let started = Instant::now();
        let report = reconciler.tick().await;
        debug!(
            "Check finished in {:?} with {} prompt(s)",
            started.elapsed(),
            report.prompted()
        );
        TickOutcome::Completed(report)
    }

    /// Tick until `shutdown` resolves; returns the number of completed ticks.
    ///
    /// A tick interrupted by shutdown is abandoned like a killed process
    /// would abandon it: approvals already saved stay saved.
    pub async fn run_until<F>(&self, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut completed = 0;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                outcome = self.trigger() => {
                    if !outcome.is_skipped() {
                        completed += 1;
                    }
                }
            }
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        info!("Scheduler stopped after {} check(s)", completed);
        completed
    }

    /// Run `f` against the reconciler once no tick is in flight.
    pub async fn with_reconciler<T>(&self, f: impl FnOnce(&Reconciler) -> T) -> T {
        let reconciler = self.reconciler.lock().await;
        f(&reconciler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::{ApprovalRequest, ApprovalSource, Decision};
    use crate::context::MonitorContext;
    use crate::{ChannelReader, PromptApproval};
    use async_trait::async_trait;
    use driftwatch_baseline::{Baseline, BaselineStore, Domain};
    use driftwatch_config::MonitorConfig;
    use driftwatch_enumerate::StaticEnumerator;
    use tokio::io::BufReader;
    use tokio::sync::Notify;

    /// Blocks every decision until released, like an operator away from
    /// the keyboard.
    struct HeldPrompt {
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl ApprovalSource for HeldPrompt {
        async fn decide(&mut self, _request: &ApprovalRequest) -> Decision {
            self.entered.notify_one();
            self.release.notified().await;
            Decision::Rejected
        }
    }

    fn in_memory_reconciler(
        baseline: Baseline,
        approvals: Box<dyn ApprovalSource>,
    ) -> Reconciler {
        let config = MonitorConfig::new().watch_process("sshd");
        // never saved: every test rejects or finds the process known
        let store = BaselineStore::new("unused-baseline.json");
        let ctx = MonitorContext::new(config, store, baseline);
        let enumerator = Arc::new(StaticEnumerator::new().with_process("sshd"));
        Reconciler::new(ctx, enumerator, approvals)
    }

    #[tokio::test]
    async fn test_overlapping_trigger_is_skipped() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let reconciler = in_memory_reconciler(
            Baseline::empty_for(&[Domain::Processes]),
            Box::new(HeldPrompt {
                entered: entered.clone(),
                release: release.clone(),
            }),
        );
        let scheduler = Scheduler::new(reconciler, Duration::from_secs(60));

        let first = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.trigger().await }
        });
        entered.notified().await;

        assert!(scheduler.trigger().await.is_skipped());

        release.notify_one();
        let outcome = first.await.unwrap();
        match outcome {
            TickOutcome::Completed(report) => assert_eq!(report.prompted(), 1),
            TickOutcome::Skipped => panic!("first tick should have run"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_wins_over_open_prompt() {
        // operator never answers; the sender stays alive for the whole test
        let (_keyboard, rx) = tokio::sync::mpsc::channel(1);
        let prompt = PromptApproval::new(
            BufReader::new(ChannelReader::new(rx)),
            tokio::io::sink(),
        );
        let reconciler =
            in_memory_reconciler(Baseline::empty_for(&[Domain::Processes]), Box::new(prompt));
        let scheduler = Scheduler::new(reconciler, Duration::from_secs(60));

        let ticks = scheduler
            .run_until(tokio::time::sleep(Duration::from_secs(5)))
            .await;
        assert_eq!(ticks, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_immediately_then_every_interval() {
        let mut baseline = Baseline::empty_for(&[Domain::Processes]);
        baseline.approve(Domain::Processes, "sshd");
        let reconciler = in_memory_reconciler(
            baseline,
            Box::new(crate::approval::ScriptedApproval::default()),
        );
        let scheduler = Scheduler::new(reconciler, Duration::from_secs(60));
        assert_eq!(scheduler.interval(), Duration::from_secs(60));

        // ticks at 0s, 60s and 120s; shutdown at 150s
        let ticks = scheduler
            .run_until(tokio::time::sleep(Duration::from_secs(150)))
            .await;
        assert_eq!(ticks, 3);

        let known = scheduler
            .with_reconciler(|r| r.baseline().len(Domain::Processes))
            .await;
        assert_eq!(known, 1);
    }
}
