//! # Batch Scheduler
//!
//! Runs the print request batch job on a fixed interval. Each tick takes the
//! distributed lock first, so with several workers only one assembles.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::database::DistributedLock;
use crate::error::Result;
use crate::services::PrintRequestBatchJob;

/// Result of one scheduler tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another process holds the lock
    Skipped,
    /// Job ran; ids of the batches it enqueued
    Ran(Vec<String>),
}

pub struct BatchScheduler {
    job: Arc<PrintRequestBatchJob>,
    lock: Arc<dyn DistributedLock>,
    lock_name: String,
    interval: Duration,
}

impl BatchScheduler {
    pub fn new(
        job: Arc<PrintRequestBatchJob>,
        lock: Arc<dyn DistributedLock>,
        lock_name: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            job,
            lock,
            lock_name: lock_name.into(),
            interval,
        }
    }

    /// One guarded run of the batch job. The lock is released even when the
    /// job fails.
    pub async fn tick(&self) -> Result<TickOutcome> {
        let Some(lease) = self.lock.try_acquire(&self.lock_name).await? else {
            debug!(lock_name = %self.lock_name, "Batch assembly running elsewhere, skipping tick");
            return Ok(TickOutcome::Skipped);
        };

        let outcome = self.job.run().await;
        lease.release().await?;
        Ok(TickOutcome::Ran(outcome?))
    }

    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        info!(
            lock_name = %self.lock_name,
            interval_seconds = self.interval.as_secs(),
            "⏰ Starting batch scheduler"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.tick().await {
                        Ok(TickOutcome::Ran(batch_ids)) if !batch_ids.is_empty() => {
                            info!(batch_count = batch_ids.len(), "Scheduled batch assembly complete");
                        }
                        Ok(_) => {}
                        Err(e) => error!(error = %e, "Scheduled batch assembly failed"),
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("Shutdown signal received, stopping batch scheduler");
                    break;
                }
            }
        }
        Ok(())
    }
}
