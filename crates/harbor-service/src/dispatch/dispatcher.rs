//! Push dispatcher worker

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use harbor_common::PushConfig;
use harbor_core::{PushQueueEntry, PushRepository};

use super::transport::PushTransport;

/// Background worker draining the push queue
///
/// Each tick selects due, undelivered, non-dead entries and hands them to
/// the transport. `mark_delivered` runs only after the transport accepts,
/// which keeps delivery at-least-once across crashes.
pub struct PushDispatcher {
    repo: Arc<dyn PushRepository>,
    transport: Arc<dyn PushTransport>,
    config: PushConfig,
    running: Arc<AtomicBool>,
}

impl PushDispatcher {
    /// Create a new PushDispatcher
    pub fn new(
        repo: Arc<dyn PushRepository>,
        transport: Arc<dyn PushTransport>,
        config: PushConfig,
    ) -> Self {
        Self {
            repo,
            transport,
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Spawn the worker loop; returns immediately
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("push dispatcher already running");
            return;
        }

        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            info!(
                tick_secs = dispatcher.config.tick_secs,
                batch_size = dispatcher.config.batch_size,
                "push dispatcher started"
            );
            let mut ticker =
                tokio::time::interval(Duration::from_secs(dispatcher.config.tick_secs));
            while dispatcher.running.load(Ordering::SeqCst) {
                ticker.tick().await;
                if let Err(e) = dispatcher.run_tick().await {
                    error!(error = %e, "push dispatch tick failed");
                }
            }
            info!("push dispatcher stopped");
        });
    }

    /// Signal the worker loop to exit after the current tick
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Select and attempt every due entry once
    #[instrument(skip(self))]
    pub async fn run_tick(&self) -> Result<(), harbor_core::DomainError> {
        let now = Utc::now();
        let due = self.repo.select_due(now, self.config.batch_size).await?;
        if due.is_empty() {
            return Ok(());
        }

        debug!(count = due.len(), "dispatching due push entries");
        for entry in due {
            self.attempt(entry).await?;
        }
        Ok(())
    }

    async fn attempt(&self, entry: PushQueueEntry) -> Result<(), harbor_core::DomainError> {
        let timeout = Duration::from_secs(self.config.delivery_timeout_secs);
        let outcome =
            tokio::time::timeout(timeout, self.transport.deliver(entry.user_id, &entry.payload))
                .await;

        match outcome {
            Ok(Ok(())) => {
                // Accept first, then mark: a crash in between re-delivers
                self.repo.mark_delivered(entry.id).await?;
                debug!(entry_id = %entry.id, user_id = %entry.user_id, "push delivered");
            }
            Ok(Err(e)) if e.is_fatal() => {
                error!(entry_id = %entry.id, user_id = %entry.user_id, error = %e, "push dead-lettered");
                self.repo.mark_dead(entry.id).await?;
            }
            Ok(Err(e)) => {
                warn!(entry_id = %entry.id, attempts = entry.attempts, error = %e, "push retry scheduled");
                self.schedule_retry(&entry).await?;
            }
            Err(_) => {
                warn!(entry_id = %entry.id, attempts = entry.attempts, "push delivery timed out");
                self.schedule_retry(&entry).await?;
            }
        }
        Ok(())
    }

    async fn schedule_retry(&self, entry: &PushQueueEntry) -> Result<(), harbor_core::DomainError> {
        let delay = self.backoff_secs(entry.attempts);
        let next = Utc::now() + chrono::Duration::seconds(delay as i64);
        self.repo.record_attempt(entry.id, next).await?;
        Ok(())
    }

    /// Exponential backoff: base * 2^attempts, capped
    fn backoff_secs(&self, attempts: u32) -> u64 {
        let factor = 1u64.checked_shl(attempts).unwrap_or(u64::MAX);
        self.config
            .base_backoff_secs
            .saturating_mul(factor)
            .min(self.config.max_backoff_secs)
    }
}
