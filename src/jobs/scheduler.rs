//! Process-lifetime scheduler for the two batch jobs.
//!
//! Constructed once at startup and handed to whoever needs to trigger ticks;
//! there is no module-level registration state. A tick that fires while the
//! previous pass is still running is skipped, so passes never overlap within
//! one process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::UnsupportedTargetPolicy;
use crate::store::CommissionStore;

use super::recalculation::recalculate_commissions;
use super::scheduled_changes::execute_scheduled_changes;

pub struct JobScheduler {
    store: Arc<dyn CommissionStore>,
    interval: Duration,
    policy: UnsupportedTargetPolicy,
    running: AtomicBool,
}

impl JobScheduler {
    pub fn new(
        store: Arc<dyn CommissionStore>,
        interval: Duration,
        policy: UnsupportedTargetPolicy,
    ) -> Self {
        Self {
            store,
            interval,
            policy,
            running: AtomicBool::new(false),
        }
    }

    /// Spawn the periodic loop. The first tick fires after one full
    /// interval, not immediately.
    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        info!(
            interval_secs = self.interval.as_secs(),
            "scheduling commission jobs"
        );
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker.tick().await; // completes immediately
            loop {
                ticker.tick().await;
                self.tick().await;
            }
        })
    }

    /// Run one tick: the change executor first, then the recalculation pass.
    /// Both jobs are idempotent, so correctness never depends on this order.
    ///
    /// Returns false if the tick was skipped because a pass was already
    /// running.
    pub async fn tick(&self) -> bool {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("previous job pass still running, skipping tick");
            return false;
        }

        match execute_scheduled_changes(self.store.as_ref(), Utc::now(), self.policy).await {
            Ok(report) => info!(
                executed = report.executed,
                errors = report.errors,
                "scheduled-change pass finished"
            ),
            Err(err) => error!(%err, "scheduled-change pass failed"),
        }

        match recalculate_commissions(self.store.as_ref()).await {
            Ok(report) => info!(
                updated = report.updated,
                errors = report.errors,
                "recalculation pass finished"
            ),
            Err(err) => error!(%err, "recalculation pass failed"),
        }

        self.running.store(false, Ordering::Release);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockStore;

    #[tokio::test]
    async fn test_tick_runs_with_empty_store() {
        let scheduler = JobScheduler::new(
            Arc::new(MockStore::new()),
            Duration::from_secs(3600),
            UnsupportedTargetPolicy::MarkExecutedNoop,
        );
        assert!(scheduler.tick().await);
        // The lease is released after the pass.
        assert!(scheduler.tick().await);
    }

    #[tokio::test]
    async fn test_overlapping_tick_is_skipped() {
        let scheduler = JobScheduler::new(
            Arc::new(MockStore::new()),
            Duration::from_secs(3600),
            UnsupportedTargetPolicy::MarkExecutedNoop,
        );
        scheduler.running.store(true, Ordering::Release);
        assert!(!scheduler.tick().await);
    }
}
