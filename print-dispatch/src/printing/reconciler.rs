//! Snapshot Reconciler
//!
//! Turns full order snapshots into "new since last observation" items.
//!
//! - Active items are those whose kitchen status is not ready/served/cancelled
//! - Keys present now but absent from the stored set are new
//! - Keys that disappear are expected (item finished) and never reported
//! - The first snapshot after a reset only seeds the baseline
//! - The stored baseline is replaced wholesale on every full snapshot

use super::dedup::{DedupKey, ItemRef};
use super::job::JobItem;
use shared::KitchenOrder;
use std::collections::{HashMap, HashSet};

/// New items detected for one order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItemGroup {
    pub order_id: String,
    pub table: String,
    pub waiter: String,
    pub items: Vec<JobItem>,
}

/// Result of one reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Baseline was empty: nothing reported, snapshot only seeded it
    pub cold_start: bool,
    pub groups: Vec<NewItemGroup>,
}

impl Reconciliation {
    pub fn new_item_count(&self) -> usize {
        self.groups.iter().map(|g| g.items.len()).sum()
    }
}

/// 快照对账器
#[derive(Debug, Default)]
pub struct SnapshotReconciler {
    baseline: HashMap<String, HashSet<DedupKey>>,
    seeded: bool,
}

/// Active items of an order with their composite keys, in list order
pub fn active_items(order: &KitchenOrder) -> Vec<(DedupKey, JobItem)> {
    order
        .items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.is_active())
        .map(|(idx, item)| {
            let job_item = JobItem::new(
                ItemRef::from_parts(item.id.as_deref(), idx),
                item.food_name.clone(),
                item.quantity,
            );
            (job_item.dedup_key(&order.id), job_item)
        })
        .collect()
}

impl SnapshotReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a baseline exists since the last reset
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Number of orders in the baseline
    pub fn tracked_orders(&self) -> usize {
        self.baseline.len()
    }

    /// Diff a full snapshot against the baseline, then replace the baseline.
    pub fn reconcile(&mut self, orders: &[KitchenOrder]) -> Reconciliation {
        let cold_start = !self.seeded;
        let mut next: HashMap<String, HashSet<DedupKey>> = HashMap::with_capacity(orders.len());
        let mut groups = Vec::new();

        for order in orders {
            let active = active_items(order);
            let previous = self.baseline.get(&order.id);

            let mut fresh = Vec::new();
            let mut keys = HashSet::with_capacity(active.len());
            for (key, item) in active {
                let seen_before = previous.is_some_and(|set| set.contains(&key));
                if !cold_start && !seen_before && !keys.contains(&key) {
                    fresh.push(item);
                }
                keys.insert(key);
            }

            if !fresh.is_empty() {
                groups.push(NewItemGroup {
                    order_id: order.id.clone(),
                    table: order.table_label().to_string(),
                    waiter: order.waiter_label().to_string(),
                    items: fresh,
                });
            }

            next.insert(order.id.clone(), keys);
        }

        self.baseline = next;
        self.seeded = true;

        if cold_start {
            tracing::info!(orders = orders.len(), "Snapshot baseline seeded");
        }

        Reconciliation { cold_start, groups }
    }

    /// Forget the baseline (cache clear / shift change)
    pub fn reset(&mut self) {
        self.baseline.clear();
        self.seeded = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{KitchenOrderItem, KitchenStatus};

    fn item(id: &str, name: &str, status: KitchenStatus) -> KitchenOrderItem {
        KitchenOrderItem {
            id: Some(id.to_string()),
            food_id: None,
            food_name: name.to_string(),
            quantity: 1,
            kitchen_status: Some(status),
            is_ready: false,
            is_cancelled: false,
        }
    }

    fn order(id: &str, items: Vec<KitchenOrderItem>) -> KitchenOrder {
        KitchenOrder {
            id: id.to_string(),
            table_name: Some("T3".to_string()),
            waiter_name: Some("W1".to_string()),
            items,
        }
    }

    fn new_ids(result: &Reconciliation) -> Vec<String> {
        result
            .groups
            .iter()
            .flat_map(|g| g.items.iter().map(|i| i.item_ref.to_string()))
            .collect()
    }

    #[test]
    fn test_cold_start_reports_nothing() {
        let mut reconciler = SnapshotReconciler::new();
        let orders = vec![order("O1", vec![item("i1", "Lagman", KitchenStatus::Pending)])];

        let result = reconciler.reconcile(&orders);
        assert!(result.cold_start);
        assert_eq!(result.new_item_count(), 0);
        assert!(reconciler.is_seeded());

        let orders = vec![order(
            "O1",
            vec![
                item("i1", "Lagman", KitchenStatus::Pending),
                item("i2", "Choy", KitchenStatus::Pending),
            ],
        )];
        let result = reconciler.reconcile(&orders);
        assert!(!result.cold_start);
        assert_eq!(new_ids(&result), vec!["i2"]);
        assert_eq!(result.groups[0].table, "T3");
        assert_eq!(result.groups[0].waiter, "W1");
    }

    #[test]
    fn test_monotonic_detection() {
        let mut reconciler = SnapshotReconciler::new();
        reconciler.reconcile(&[]);

        let s1 = vec![order("O1", vec![item("A", "Lagman", KitchenStatus::Pending)])];
        assert_eq!(new_ids(&reconciler.reconcile(&s1)), vec!["A"]);

        let s2 = vec![order(
            "O1",
            vec![
                item("A", "Lagman", KitchenStatus::Pending),
                item("B", "Choy", KitchenStatus::Pending),
            ],
        )];
        assert_eq!(new_ids(&reconciler.reconcile(&s2)), vec!["B"]);

        // A became ready: no removal signal, nothing new
        let s3 = vec![order(
            "O1",
            vec![
                item("A", "Lagman", KitchenStatus::Ready),
                item("B", "Choy", KitchenStatus::Pending),
            ],
        )];
        let result = reconciler.reconcile(&s3);
        assert!(result.groups.is_empty());
    }

    #[test]
    fn test_inactive_items_are_ignored() {
        let mut reconciler = SnapshotReconciler::new();
        reconciler.reconcile(&[]);

        let orders = vec![order(
            "O1",
            vec![
                item("i1", "Lagman", KitchenStatus::Served),
                item("i2", "Choy", KitchenStatus::Cancelled),
                item("i3", "Non", KitchenStatus::Preparing),
            ],
        )];
        assert_eq!(new_ids(&reconciler.reconcile(&orders)), vec!["i3"]);
    }

    #[test]
    fn test_positional_index_when_id_missing() {
        let mut reconciler = SnapshotReconciler::new();
        reconciler.reconcile(&[]);

        let mut untagged = item("x", "Somsa", KitchenStatus::Pending);
        untagged.id = None;
        let orders = vec![order(
            "O1",
            vec![item("i1", "Lagman", KitchenStatus::Ready), untagged],
        )];
        assert_eq!(new_ids(&reconciler.reconcile(&orders)), vec!["idx-1"]);
    }

    #[test]
    fn test_baseline_replaced_even_without_news() {
        let mut reconciler = SnapshotReconciler::new();
        reconciler.reconcile(&[order("O1", vec![item("i1", "Lagman", KitchenStatus::Pending)])]);
        assert_eq!(reconciler.tracked_orders(), 1);

        // Order vanished from the full view: dropped from the baseline
        let result = reconciler.reconcile(&[order("O2", vec![])]);
        assert!(result.groups.is_empty());
        assert_eq!(reconciler.tracked_orders(), 1);

        // A returning order is compared against nothing
        let result =
            reconciler.reconcile(&[order("O1", vec![item("i1", "Lagman", KitchenStatus::Pending)])]);
        assert_eq!(new_ids(&result), vec!["i1"]);
    }

    #[test]
    fn test_reset_requires_new_seed() {
        let mut reconciler = SnapshotReconciler::new();
        let orders = vec![order("O1", vec![item("i1", "Lagman", KitchenStatus::Pending)])];

        assert!(reconciler.reconcile(&orders).cold_start);
        assert!(reconciler.reconcile(&orders).groups.is_empty());

        reconciler.reset();
        assert!(!reconciler.is_seeded());
        let with_new = vec![order(
            "O1",
            vec![
                item("i1", "Lagman", KitchenStatus::Pending),
                item("i2", "Choy", KitchenStatus::Pending),
            ],
        )];
        let result = reconciler.reconcile(&with_new);
        assert!(result.cold_start);
        assert!(result.groups.is_empty());
    }
}
