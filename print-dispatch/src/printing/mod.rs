//! 厨房打印调度
//!
//! - dedup: short-lived item keys blocking duplicate jobs
//! - reconciler: full snapshot → new items
//! - queue / processor: FIFO job queue, single-flight printing with retries
//! - ingest: real-time events into the queue

mod dedup;
mod ingest;
mod job;
mod processor;
mod queue;
mod reconciler;

#[cfg(test)]
pub(crate) mod testing;

pub use dedup::{DEFAULT_DEDUP_WINDOW, DedupKey, DedupKeyStore, ItemRef};
pub use ingest::{DEFAULT_SUPPRESSION_WINDOW, EventIngestor, IngestMessage, IngestReport};
pub use job::{JobItem, JobStatus, PrintJob, job_id_for_keys};
pub use processor::{DEFAULT_TICK_INTERVAL, PrintProcessor, TickOutcome};
pub use queue::{
    AttemptOutcome, Claim, EnqueueOutcome, FlightGuard, PrintQueue, QueueConfig, QueueStats,
    QueueStatus,
};
pub use reconciler::{NewItemGroup, Reconciliation, SnapshotReconciler, active_items};
