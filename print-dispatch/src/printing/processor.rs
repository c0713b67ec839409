//! Print Processor
//!
//! 定时取单打印：每个 tick 尝试处理一个任务，单飞锁保证同一时刻最多一个任务在打印。
//!
//! ```text
//! tick ──► claim_next ──► Busy / Idle (no-op)
//!              │
//!              └─► printing ──► transport ──► ok   ──► completed + backend sync (detached)
//!                                        └─► err  ──► retry after backoff / failed
//! ```

use super::job::PrintJob;
use super::queue::{AttemptOutcome, Claim, PrintQueue};
use crate::services::{BackendApi, SettingsStore};
use kitchen_printer::{PrintAck, PrintError, PrintResult, PrinterTransport};
use std::sync::Arc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default processor tick
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// What one tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Single-flight lock held by another tick
    Busy,
    /// No pending job
    Idle,
    Completed {
        job_id: String,
    },
    /// Transient failure, job back to pending
    Retrying {
        job_id: String,
        attempt: u32,
        error: String,
    },
    /// Retries exhausted, job removed
    Failed {
        job_id: String,
        error: String,
    },
    /// Job vanished mid-flight (cache cleared)
    Discarded {
        job_id: String,
    },
}

/// 打印处理器
#[derive(Clone)]
pub struct PrintProcessor {
    queue: Arc<PrintQueue>,
    transport: Arc<dyn PrinterTransport>,
    backend: Arc<dyn BackendApi>,
    settings: Arc<SettingsStore>,
    interval: Duration,
}

impl PrintProcessor {
    pub fn new(
        queue: Arc<PrintQueue>,
        transport: Arc<dyn PrinterTransport>,
        backend: Arc<dyn BackendApi>,
        settings: Arc<SettingsStore>,
    ) -> Self {
        Self {
            queue,
            transport,
            backend,
            settings,
            interval: DEFAULT_TICK_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Process at most one job.
    ///
    /// The single-flight lock is held from claim until the result is applied,
    /// including the retry backoff, so the oldest job keeps its turn.
    pub async fn process_next(&self) -> TickOutcome {
        let (_guard, job) = match self.queue.claim_next() {
            Claim::Busy => return TickOutcome::Busy,
            Claim::Idle => return TickOutcome::Idle,
            Claim::Job(guard, job) => (guard, job),
        };

        match self.send(&job).await {
            Ok(ack) => {
                debug!(job_id = %job.id, message = ?ack.message, "Print acknowledged");
                if self.queue.complete(&job).is_none() {
                    debug!(job_id = %job.id, "Printed job was cleared from the queue");
                }
                // Paper is out either way; sync even if the queue was cleared
                self.sync_printed_status(&job);
                TickOutcome::Completed { job_id: job.id }
            }
            Err(e) => {
                let error = e.to_string();
                match self.queue.record_failure(&job, &error) {
                    AttemptOutcome::Retry { attempt } => {
                        tokio::time::sleep(self.queue.config().retry_delay).await;
                        TickOutcome::Retrying {
                            job_id: job.id,
                            attempt,
                            error,
                        }
                    }
                    AttemptOutcome::Exhausted => TickOutcome::Failed {
                        job_id: job.id,
                        error,
                    },
                    AttemptOutcome::Gone => TickOutcome::Discarded { job_id: job.id },
                }
            }
        }
    }

    /// Read settings, build the ticket and call the transport under a timeout
    async fn send(&self, job: &PrintJob) -> PrintResult<PrintAck> {
        let settings = self.settings.get();
        let printer = settings
            .selected_printer
            .filter(|p| !p.is_empty())
            .ok_or(PrintError::NoPrinterSelected)?;

        let ticket = job.to_ticket(&printer, &settings.restaurant_name);
        let timeout = self.queue.config().print_timeout;

        match tokio::time::timeout(timeout, self.transport.print_ticket(&ticket)).await {
            Ok(result) => result,
            Err(_) => Err(PrintError::Timeout(format!(
                "no answer from printer within {:?}",
                timeout
            ))),
        }
    }

    /// Best-effort "mark as printed"; failure is logged only
    fn sync_printed_status(&self, job: &PrintJob) {
        if job.backend_item_ids.is_empty() {
            return;
        }

        let backend = Arc::clone(&self.backend);
        let item_ids = job.backend_item_ids.clone();
        let job_id = job.id.clone();
        tokio::spawn(async move {
            match backend.mark_items_printed(&item_ids).await {
                Ok(()) => {
                    info!(job_id = %job_id, count = item_ids.len(), "Items marked as printed");
                }
                Err(e) => {
                    warn!(job_id = %job_id, error = %e, "Failed to update printer status");
                }
            }
        });
    }

    /// 运行处理循环（阻塞直到 shutdown）
    pub async fn run(self, shutdown: CancellationToken) {
        info!(interval_ms = self.interval.as_millis() as u64, "Print processor started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Print processor received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    let this = self.clone();
                    tokio::spawn(async move {
                        this.process_next().await;
                    });
                }
            }
        }
    }
}
