//! Print Job Queue
//!
//! 打印任务队列：去重入队、FIFO 取单、单飞锁、重试计数。
//!
//! The queue owns every [`PrintJob`]. Jobs leave the queue when they reach a
//! terminal status. The single-flight guard is taken synchronously in
//! [`PrintQueue::claim_next`] before any awaiting happens, so overlapping
//! ticks can never dispatch two jobs.

use super::dedup::{DedupKey, DedupKeyStore};
use super::job::{JobItem, JobStatus, PrintJob, job_id_for_keys};
use kitchen_printer::TicketLine;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

/// 队列配置
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Transport attempts per job before it is marked failed
    pub max_retries: u32,
    /// Fixed backoff before a failed job is retried
    pub retry_delay: Duration,
    /// Upper bound for one transport call
    pub print_timeout: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
            print_timeout: Duration::from_secs(10),
        }
    }
}

/// Result of [`PrintQueue::enqueue`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueOutcome {
    pub added: usize,
    pub skipped: usize,
    /// Set when a job was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

/// 打印统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub pending: usize,
    pub completed: u64,
    pub failed: u64,
    pub total_processed: u64,
}

/// 队列状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    pub queue_size: usize,
    pub is_processing: bool,
    pub printed_count: usize,
}

/// What happened to a job after a failed transport attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Back to pending; `attempt` failures so far
    Retry { attempt: u32 },
    /// Retries exhausted, job removed as failed
    Exhausted,
    /// Job was no longer queued (cache cleared mid-flight)
    Gone,
}

/// Result of trying to claim work
pub enum Claim<'a> {
    /// Another job is in flight
    Busy,
    /// Nothing pending
    Idle,
    /// Oldest pending job, now `printing`; the guard releases the lock on drop
    Job(FlightGuard<'a>, PrintJob),
}

/// Single-flight lock, released on drop
pub struct FlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[derive(Debug, Default)]
struct QueueInner {
    jobs: VecDeque<PrintJob>,
    completed: u64,
    failed: u64,
    total_processed: u64,
    next_seq: u64,
}

impl QueueInner {
    fn push(&mut self, mut job: PrintJob) {
        job.seq = self.next_seq;
        self.next_seq += 1;
        self.jobs.push_back(job);
    }

    /// Locate the claimed job. Ids repeat once a clear drops the dedup keys,
    /// so the sequence number decides.
    fn position(&self, claimed: &PrintJob) -> Option<usize> {
        self.jobs
            .iter()
            .position(|j| j.seq == claimed.seq && j.id == claimed.id)
    }
}

/// 打印队列
#[derive(Debug)]
pub struct PrintQueue {
    inner: Mutex<QueueInner>,
    dedup: Arc<DedupKeyStore>,
    config: QueueConfig,
    in_flight: AtomicBool,
}

impl PrintQueue {
    pub fn new(dedup: Arc<DedupKeyStore>, config: QueueConfig) -> Self {
        Self {
            inner: Mutex::new(QueueInner::default()),
            dedup,
            config,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn dedup(&self) -> &Arc<DedupKeyStore> {
        &self.dedup
    }

    /// Queue the items of one order that have not been handled yet.
    ///
    /// Each item is reserved in the dedup store first; already reserved items
    /// are dropped and counted as `skipped`. No job is created when nothing
    /// survives.
    pub fn enqueue(
        &self,
        order_id: &str,
        table: &str,
        waiter: &str,
        items: &[JobItem],
    ) -> EnqueueOutcome {
        let mut lines = Vec::new();
        let mut keys = Vec::new();
        let mut backend_ids = Vec::new();
        let mut skipped = 0;

        for item in items {
            let key = item.dedup_key(order_id);
            if self.dedup.reserve(&key) {
                lines.push(TicketLine::new(item.food_name.clone(), item.quantity));
                if let Some(id) = item.item_ref.backend_id() {
                    backend_ids.push(id.to_string());
                }
                keys.push(key);
            } else {
                skipped += 1;
                debug!(key = %key, "Item skipped (duplicate)");
            }
        }

        let added = lines.len();
        if added == 0 {
            return EnqueueOutcome {
                added,
                skipped,
                job_id: None,
            };
        }

        let job_id = job_id_for_keys(order_id, &keys);
        let job = PrintJob::new(job_id.clone(), order_id, table, waiter, lines, backend_ids, 0);

        let queue_size = {
            let mut inner = self.inner.lock();
            inner.push(job);
            inner.jobs.len()
        };

        info!(
            job_id = %job_id,
            order_id = %order_id,
            added,
            skipped,
            queue_size,
            "Print job created"
        );

        EnqueueOutcome {
            added,
            skipped,
            job_id: Some(job_id),
        }
    }

    /// Queue a whole ticket under a single ticket-level key.
    ///
    /// Returns `false` when the same ticket is already inside the dedup window.
    pub fn enqueue_ticket(
        &self,
        order_id: &str,
        table: &str,
        waiter: &str,
        items: &[JobItem],
    ) -> bool {
        if items.is_empty() {
            return false;
        }

        let key = DedupKey::for_ticket(
            order_id,
            table,
            items.iter().map(|i| (i.food_name.as_str(), i.quantity)),
        );
        if !self.dedup.reserve(&key) {
            debug!(key = %key, "Ticket skipped (already printed)");
            return false;
        }

        let lines = items
            .iter()
            .map(|i| TicketLine::new(i.food_name.clone(), i.quantity))
            .collect();
        let backend_ids = items
            .iter()
            .filter_map(|i| i.item_ref.backend_id().map(str::to_string))
            .collect();
        let job = PrintJob::new(key.to_string(), order_id, table, waiter, lines, backend_ids, 0);

        let mut inner = self.inner.lock();
        inner.push(job);
        info!(job_id = %key, queue_size = inner.jobs.len(), "Ticket job added");
        true
    }

    /// Take the single-flight lock and claim the oldest pending job.
    pub fn claim_next(&self) -> Claim<'_> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Claim::Busy;
        }
        let guard = FlightGuard {
            flag: &self.in_flight,
        };

        let mut inner = self.inner.lock();
        let next = inner
            .jobs
            .iter_mut()
            .filter(|j| j.status == JobStatus::Pending)
            .min_by_key(|j| j.seq);

        match next {
            Some(job) => {
                job.status = JobStatus::Printing;
                debug!(job_id = %job.id, attempt = job.retry_count + 1, "Processing job");
                Claim::Job(guard, job.clone())
            }
            None => Claim::Idle,
        }
    }

    /// Transport acknowledged the job: remove it and count the success.
    ///
    /// Returns the removed job, or `None` if it had already been cleared.
    pub fn complete(&self, claimed: &PrintJob) -> Option<PrintJob> {
        let job_id = claimed.id.as_str();
        let mut inner = self.inner.lock();
        let Some(pos) = inner.position(claimed) else {
            warn!(job_id = %job_id, "Completed job no longer queued");
            return None;
        };

        let mut job = inner.jobs.remove(pos)?;
        job.status = JobStatus::Completed;
        inner.completed += 1;
        inner.total_processed += 1;
        info!(job_id = %job_id, "Job completed");
        Some(job)
    }

    /// Record a failed transport attempt.
    pub fn record_failure(&self, claimed: &PrintJob, reason: &str) -> AttemptOutcome {
        let job_id = claimed.id.as_str();
        let mut inner = self.inner.lock();
        let Some(pos) = inner.position(claimed) else {
            return AttemptOutcome::Gone;
        };

        let max_retries = self.config.max_retries;
        let job = &mut inner.jobs[pos];
        job.retry_count += 1;

        if job.retry_count >= max_retries {
            job.status = JobStatus::Failed;
            inner.jobs.remove(pos);
            inner.failed += 1;
            error!(
                job_id = %job_id,
                retries = max_retries,
                error = %reason,
                "Job FAILED, retries exhausted"
            );
            AttemptOutcome::Exhausted
        } else {
            job.status = JobStatus::Pending;
            let attempt = job.retry_count;
            warn!(
                job_id = %job_id,
                "Job retry {}/{}: {}",
                attempt,
                max_retries,
                reason
            );
            AttemptOutcome::Retry { attempt }
        }
    }

    pub fn stats(&self) -> QueueStats {
        let inner = self.inner.lock();
        QueueStats {
            pending: inner.jobs.len(),
            completed: inner.completed,
            failed: inner.failed,
            total_processed: inner.total_processed,
        }
    }

    pub fn status(&self) -> QueueStatus {
        let queue_size = self.inner.lock().jobs.len();
        QueueStatus {
            queue_size,
            is_processing: self.in_flight.load(Ordering::Acquire),
            printed_count: self.dedup.live_count(),
        }
    }

    /// Snapshot of queued jobs in creation order
    pub fn jobs(&self) -> Vec<PrintJob> {
        let inner = self.inner.lock();
        let mut jobs: Vec<PrintJob> = inner.jobs.iter().cloned().collect();
        jobs.sort_by_key(|j| j.seq);
        jobs
    }

    pub fn len(&self) -> usize {
        self.inner.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop queued jobs and reset counters (new shift).
    ///
    /// A job already in flight finishes; its result finds nothing to update.
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.lock();
        let dropped = inner.jobs.len();
        let next_seq = inner.next_seq;
        *inner = QueueInner {
            next_seq,
            ..QueueInner::default()
        };
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue() -> PrintQueue {
        PrintQueue::new(Arc::new(DedupKeyStore::default()), QueueConfig::default())
    }

    fn lagman() -> JobItem {
        JobItem::with_id("i1", "Lagman", 2)
    }

    fn claim(queue: &PrintQueue) -> PrintJob {
        match queue.claim_next() {
            Claim::Job(_, job) => job,
            Claim::Busy => panic!("unexpected busy"),
            Claim::Idle => panic!("unexpected idle"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_enqueue_twice_adds_once() {
        let queue = queue();

        let first = queue.enqueue("O1", "T3", "W1", &[lagman()]);
        assert_eq!((first.added, first.skipped), (1, 0));
        assert!(first.job_id.is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        let second = queue.enqueue("O1", "T3", "W1", &[lagman()]);
        assert_eq!(
            second,
            EnqueueOutcome {
                added: 0,
                skipped: 1,
                job_id: None
            }
        );
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.jobs()[0].items.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_duplicates() {
        let queue = queue();
        queue.enqueue("O1", "T3", "W1", &[lagman()]);

        let outcome = queue.enqueue(
            "O1",
            "T3",
            "W1",
            &[lagman(), JobItem::with_id("i2", "Choy", 1)],
        );
        assert_eq!((outcome.added, outcome.skipped), (1, 1));

        let jobs = queue.jobs();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[1].items, vec![TicketLine::new("Choy", 1)]);
        assert_eq!(jobs[1].backend_item_ids, vec!["i2".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_enqueue_creates_nothing() {
        let queue = queue();
        let outcome = queue.enqueue("O1", "T3", "W1", &[]);
        assert_eq!(outcome, EnqueueOutcome::default());
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_enqueue_ticket_dedup() {
        let queue = queue();
        let items = [lagman(), JobItem::with_id("i2", "Somsa", 3)];
        assert!(queue.enqueue_ticket("O1", "T3", "W1", &items));
        assert!(!queue.enqueue_ticket("O1", "T3", "W1", &[items[1].clone(), items[0].clone()]));
        assert!(!queue.enqueue_ticket("O1", "T3", "W1", &[]));

        let jobs = queue.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, "O1-T3-Lagman:2|Somsa:3");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fifo_and_single_flight() {
        let queue = queue();
        queue.enqueue("O1", "T1", "W1", &[lagman()]);
        queue.enqueue("O2", "T2", "W1", &[JobItem::with_id("i9", "Choy", 1)]);

        let Claim::Job(guard, job) = queue.claim_next() else {
            panic!("expected a job");
        };
        assert_eq!(job.order_id, "O1");
        assert!(queue.status().is_processing);
        assert!(matches!(queue.claim_next(), Claim::Busy));

        queue.complete(&job);
        drop(guard);

        assert!(!queue.status().is_processing);
        assert_eq!(claim(&queue).order_id, "O2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_when_nothing_pending() {
        let queue = queue();
        assert!(matches!(queue.claim_next(), Claim::Idle));
        // Guard released after an idle claim
        assert!(!queue.status().is_processing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_then_fail() {
        let queue = queue();
        queue.enqueue("O1", "T3", "W1", &[lagman()]);

        let job = claim(&queue);
        assert_eq!(
            queue.record_failure(&job, "offline"),
            AttemptOutcome::Retry { attempt: 1 }
        );
        assert_eq!(queue.jobs()[0].status, JobStatus::Pending);

        let job = claim(&queue);
        assert_eq!(
            queue.record_failure(&job, "offline"),
            AttemptOutcome::Retry { attempt: 2 }
        );

        let job = claim(&queue);
        assert_eq!(queue.record_failure(&job, "offline"), AttemptOutcome::Exhausted);

        assert!(queue.is_empty());
        let stats = queue.stats();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.completed, 0);
        assert_eq!(stats.pending, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_updates_stats() {
        let queue = queue();
        queue.enqueue("O1", "T3", "W1", &[lagman()]);
        let job = claim(&queue);

        let done = queue.complete(&job).unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(
            queue.stats(),
            QueueStats {
                pending: 0,
                completed: 1,
                failed: 0,
                total_processed: 1
            }
        );
        assert!(queue.complete(&job).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_while_in_flight() {
        let queue = queue();
        queue.enqueue("O1", "T3", "W1", &[lagman()]);
        queue.enqueue("O2", "T4", "W1", &[JobItem::with_id("i2", "Choy", 1)]);

        let Claim::Job(_guard, job) = queue.claim_next() else {
            panic!("expected a job");
        };
        assert_eq!(queue.clear(), 2);
        assert_eq!(queue.record_failure(&job, "late"), AttemptOutcome::Gone);
        assert!(queue.complete(&job).is_none());
        assert_eq!(queue.stats(), QueueStats::default());
        // Dedup keys are the store's business, not the queue's
        assert_eq!(queue.status().printed_count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_result_ignores_requeued_twin() {
        let queue = queue();
        queue.enqueue("O1", "T3", "W1", &[lagman()]);

        let Claim::Job(guard, stale) = queue.claim_next() else {
            panic!("expected a job");
        };
        queue.dedup().clear();
        queue.clear();

        // Same items again: same deterministic id, fresh job
        let outcome = queue.enqueue("O1", "T3", "W1", &[lagman()]);
        assert_eq!(outcome.job_id.as_deref(), Some(stale.id.as_str()));

        for _ in 0..3 {
            assert_eq!(queue.record_failure(&stale, "late"), AttemptOutcome::Gone);
        }
        assert!(queue.complete(&stale).is_none());

        let jobs = queue.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].retry_count, 0);
        assert_eq!(jobs[0].status, JobStatus::Pending);
        assert_eq!(queue.stats().failed, 0);
        assert_eq!(queue.stats().completed, 0);

        drop(guard);
        let fresh = claim(&queue);
        assert_ne!(fresh.seq, stale.seq);
        assert!(queue.complete(&fresh).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_printed_count_skips_expired_keys() {
        let queue = PrintQueue::new(
            Arc::new(DedupKeyStore::new(Duration::from_secs(60))),
            QueueConfig::default(),
        );
        queue.enqueue("O1", "T3", "W1", &[lagman()]);
        tokio::time::advance(Duration::from_secs(30)).await;
        queue.enqueue("O2", "T4", "W1", &[JobItem::with_id("i2", "Choy", 1)]);
        assert_eq!(queue.status().printed_count, 2);

        tokio::time::advance(Duration::from_secs(31)).await;
        // O1's key expired but is not purged yet
        assert_eq!(queue.dedup().len(), 2);
        assert_eq!(queue.status().printed_count, 1);
    }
}
