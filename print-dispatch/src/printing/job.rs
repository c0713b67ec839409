//! Print job types

use super::dedup::{DedupKey, ItemRef};
use kitchen_printer::{KitchenTicket, TicketLine};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// 打印任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Printing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// An item offered to the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobItem {
    pub item_ref: ItemRef,
    pub food_name: String,
    pub quantity: u32,
}

impl JobItem {
    pub fn new(item_ref: ItemRef, food_name: impl Into<String>, quantity: u32) -> Self {
        Self {
            item_ref,
            food_name: food_name.into(),
            quantity,
        }
    }

    /// Item carrying a backend id
    pub fn with_id(id: impl Into<String>, food_name: impl Into<String>, quantity: u32) -> Self {
        Self::new(ItemRef::Id(id.into()), food_name, quantity)
    }

    pub fn dedup_key(&self, order_id: &str) -> DedupKey {
        DedupKey::for_item(order_id, &self.item_ref, &self.food_name, self.quantity)
    }
}

/// One kitchen ticket waiting for (or going through) the printer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintJob {
    /// Deterministic; doubles as the transport idempotency key
    pub id: String,
    pub order_id: String,
    pub table: String,
    pub waiter: String,
    pub items: Vec<TicketLine>,
    /// Backend ids to mark as printed once the ticket is out
    pub backend_item_ids: Vec<String>,
    /// Unix millis
    pub created_at: i64,
    pub retry_count: u32,
    pub status: JobStatus,
    /// Creation order within the queue (FIFO tiebreak)
    #[serde(skip)]
    pub(crate) seq: u64,
}

impl PrintJob {
    pub(crate) fn new(
        id: String,
        order_id: &str,
        table: &str,
        waiter: &str,
        items: Vec<TicketLine>,
        backend_item_ids: Vec<String>,
        seq: u64,
    ) -> Self {
        Self {
            id,
            order_id: order_id.to_string(),
            table: table.to_string(),
            waiter: waiter.to_string(),
            items,
            backend_item_ids,
            created_at: shared::util::now_millis(),
            retry_count: 0,
            status: JobStatus::Pending,
            seq,
        }
    }

    /// Build the transport payload for the currently selected printer
    pub fn to_ticket(&self, printer_name: &str, restaurant_name: &str) -> KitchenTicket {
        KitchenTicket::new(
            printer_name,
            restaurant_name,
            &self.table,
            &self.waiter,
            self.items.clone(),
            &self.id,
        )
        .with_created_at(shared::util::now_rfc3339())
    }
}

/// Job id for item-level jobs: order id plus a digest of the sorted item keys
pub fn job_id_for_keys(order_id: &str, keys: &[DedupKey]) -> String {
    let mut sorted: Vec<&DedupKey> = keys.iter().collect();
    sorted.sort();

    let mut hasher = Sha256::new();
    for key in sorted {
        hasher.update(key.as_str().as_bytes());
        hasher.update(b"\n");
    }
    let digest = hex::encode(hasher.finalize());
    format!("job-{}-{}", order_id, &digest[..16])
}
