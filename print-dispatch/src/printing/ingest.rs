//! Event Ingestion
//!
//! 实时事件入口：两个通道汇入同一个队列。
//!
//! - `new-items`: 后端已标注的新菜，绕过对账器直接入队
//! - `orders-snapshot`: 全量订单，经对账器得出增量后入队
//! - `shift`: 班次开始/结束，清空缓存
//!
//! After a `new-items` event an order is suppressed on the snapshot channel
//! for a short window, so one physical event cannot trigger both channels.
//!
//! The ingestor is the single consumer of its channel: reconciliation, dedup
//! reservation and enqueueing all happen on that one task.

use super::dedup::ItemRef;
use super::job::JobItem;
use super::queue::PrintQueue;
use super::reconciler::{SnapshotReconciler, active_items};
use crate::services::{NewOrderAlert, Notifier, SettingsStore};
use shared::{
    KitchenOrder, KitchenStatus, NewItem, NewItemsEvent, OrdersSnapshotEvent, RealtimeEvent,
    ShiftEvent,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default new-items / snapshot mutual exclusion window
pub const DEFAULT_SUPPRESSION_WINDOW: Duration = Duration::from_secs(2);

/// Messages accepted by the ingest worker
#[derive(Debug, Clone)]
pub enum IngestMessage {
    Event(RealtimeEvent),
    /// Operator-requested cache clear
    ClearCache,
}

impl From<RealtimeEvent> for IngestMessage {
    fn from(event: RealtimeEvent) -> Self {
        IngestMessage::Event(event)
    }
}

/// What one message did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub added: usize,
    pub skipped: usize,
    /// Snapshot items held back by the suppression window
    pub suppressed: usize,
    /// Items seen while auto-print was off
    pub not_printed: usize,
    pub job_ids: Vec<String>,
    pub cold_start: bool,
    /// Backlog keys registered on cold start
    pub registered: usize,
    /// Jobs dropped by a cache clear
    pub cleared: usize,
}

/// 事件入口
pub struct EventIngestor {
    reconciler: SnapshotReconciler,
    queue: Arc<PrintQueue>,
    settings: Arc<SettingsStore>,
    notifier: Arc<dyn Notifier>,
    suppression_window: Duration,
    suppressed_until: HashMap<String, Instant>,
}

impl EventIngestor {
    pub fn new(
        queue: Arc<PrintQueue>,
        settings: Arc<SettingsStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            reconciler: SnapshotReconciler::new(),
            queue,
            settings,
            notifier,
            suppression_window: DEFAULT_SUPPRESSION_WINDOW,
            suppressed_until: HashMap::new(),
        }
    }

    pub fn with_suppression_window(mut self, window: Duration) -> Self {
        self.suppression_window = window;
        self
    }

    pub fn reconciler(&self) -> &SnapshotReconciler {
        &self.reconciler
    }

    /// 处理一条消息
    pub fn handle(&mut self, message: IngestMessage) -> IngestReport {
        match message {
            IngestMessage::Event(RealtimeEvent::NewItems(event)) => self.on_new_items(event),
            IngestMessage::Event(RealtimeEvent::OrdersSnapshot(event)) => self.on_snapshot(event),
            IngestMessage::Event(RealtimeEvent::Shift(event)) => self.on_shift(event),
            IngestMessage::ClearCache => self.clear_cache(),
        }
    }

    fn on_new_items(&mut self, event: NewItemsEvent) -> IngestReport {
        let mut report = IngestReport::default();
        let Some(order) = event.target_order().cloned() else {
            warn!("new-items event without any order, ignored");
            return report;
        };

        // allOrders may be filtered by the cook's categories, so it never
        // replaces the snapshot baseline
        let items = resolve_new_items(&order, &event.new_items);
        if items.is_empty() {
            debug!(order_id = %order.id, "new-items event with no items");
            return report;
        }

        self.suppressed_until
            .insert(order.id.clone(), Instant::now() + self.suppression_window);

        self.dispatch(&order.id, order.table_label(), order.waiter_label(), &items, &mut report);
        report
    }

    fn on_snapshot(&mut self, event: OrdersSnapshotEvent) -> IngestReport {
        let result = self.reconciler.reconcile(&event.all_orders);
        let mut report = IngestReport {
            cold_start: result.cold_start,
            ..IngestReport::default()
        };

        if result.cold_start {
            report.registered = self.register_existing(&event.all_orders);
            return report;
        }

        let now = Instant::now();
        self.suppressed_until.retain(|_, until| *until > now);

        for group in result.groups {
            if self.suppressed_until.contains_key(&group.order_id) {
                info!(
                    order_id = %group.order_id,
                    items = group.items.len(),
                    "Snapshot delta suppressed (new-items just handled)"
                );
                report.suppressed += group.items.len();
                continue;
            }
            self.dispatch(&group.order_id, &group.table, &group.waiter, &group.items, &mut report);
        }
        report
    }

    fn on_shift(&mut self, event: ShiftEvent) -> IngestReport {
        info!(kind = ?event.kind, shift_id = ?event.shift_id, "Shift boundary, clearing print cache");
        self.clear_cache()
    }

    /// Alert the cook and, with auto-print on, queue the items
    fn dispatch(
        &self,
        order_id: &str,
        table: &str,
        waiter: &str,
        items: &[JobItem],
        report: &mut IngestReport,
    ) {
        let notifier = Arc::clone(&self.notifier);
        let alert = NewOrderAlert::new(table, items);
        tokio::spawn(async move { notifier.notify(alert).await });

        if !self.settings.get().auto_print {
            info!(order_id = %order_id, items = items.len(), "Auto-print disabled, not queued");
            report.not_printed += items.len();
            return;
        }

        let outcome = self.queue.enqueue(order_id, table, waiter, items);
        report.added += outcome.added;
        report.skipped += outcome.skipped;
        report.job_ids.extend(outcome.job_id);
    }

    /// Mark every pending item of a seeding snapshot as already handled.
    ///
    /// The backlog was on screen before we started; a late explicit
    /// `new-items` for it must not print it again.
    pub fn register_existing(&self, orders: &[KitchenOrder]) -> usize {
        let dedup = self.queue.dedup();
        let mut registered = 0;
        for order in orders {
            for (idx, item) in order.items.iter().enumerate() {
                if item.status() != KitchenStatus::Pending {
                    continue;
                }
                let key = JobItem::new(
                    ItemRef::from_parts(item.id.as_deref(), idx),
                    item.food_name.clone(),
                    item.quantity,
                )
                .dedup_key(&order.id);
                if !dedup.contains(&key) {
                    dedup.mark(&key);
                    registered += 1;
                }
            }
        }

        if registered > 0 {
            info!(registered, "Existing items registered as printed");
        }
        registered
    }

    /// Forget everything: dedup keys, queued jobs, baseline and windows
    pub fn clear_cache(&mut self) -> IngestReport {
        let keys = self.queue.dedup().clear();
        let cleared = self.queue.clear();
        self.reconciler.reset();
        self.suppressed_until.clear();
        info!(keys, jobs = cleared, "Print cache cleared");
        IngestReport {
            cleared,
            ..IngestReport::default()
        }
    }

    /// 运行入口（阻塞直到通道关闭或 shutdown）
    pub async fn run(mut self, mut rx: mpsc::Receiver<IngestMessage>, shutdown: CancellationToken) {
        info!("Event ingestor started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Event ingestor received shutdown signal");
                    break;
                }
                message = rx.recv() => {
                    let Some(message) = message else {
                        info!("Ingest channel closed, event ingestor stopping");
                        break;
                    };
                    let report = self.handle(message);
                    if report.added > 0 || report.skipped > 0 || report.suppressed > 0 {
                        debug!(
                            added = report.added,
                            skipped = report.skipped,
                            suppressed = report.suppressed,
                            "Event handled"
                        );
                    }
                }
            }
        }
    }
}

/// Attach item references to explicitly labelled new items.
///
/// Items without an id are matched against the order's active items by name
/// and quantity (latest first) so both channels derive the same key.
fn resolve_new_items(order: &KitchenOrder, new_items: &[NewItem]) -> Vec<JobItem> {
    let mut candidates: Vec<JobItem> = active_items(order).into_iter().map(|(_, i)| i).collect();

    new_items
        .iter()
        .map(|new_item| {
            let item_ref = match &new_item.item_id {
                Some(id) => {
                    candidates.retain(|c| c.item_ref.backend_id() != Some(id.as_str()));
                    ItemRef::Id(id.clone())
                }
                None => candidates
                    .iter()
                    .rposition(|c| {
                        c.food_name == new_item.food_name && c.quantity == new_item.quantity
                    })
                    .map(|pos| candidates.remove(pos).item_ref)
                    .unwrap_or(ItemRef::Unknown),
            };
            JobItem::new(item_ref, new_item.food_name.clone(), new_item.quantity)
        })
        .collect()
}
