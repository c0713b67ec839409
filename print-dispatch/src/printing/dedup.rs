//! Dedup Key Store
//!
//! 短期去重集合：记录已入队/已打印的菜品，窗口期内阻止重复建单。
//!
//! Reservation is check-and-insert under the map's entry lock, so two
//! near-simultaneous reservations of one key never both succeed. Expiry is
//! measured on the tokio clock: a key older than the window counts as absent,
//! and the purge loop physically removes such keys.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::fmt;
use std::sync::Arc;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Default dedup window (5 minutes)
pub const DEFAULT_DEDUP_WINDOW: Duration = Duration::from_secs(5 * 60);

/// How an item is identified inside its order
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemRef {
    /// Backend item id
    Id(String),
    /// Position in the order's item list (payload carried no id)
    Index(usize),
    /// Neither id nor resolvable position
    Unknown,
}

impl ItemRef {
    pub fn from_parts(id: Option<&str>, index: usize) -> Self {
        match id {
            Some(id) if !id.is_empty() => ItemRef::Id(id.to_string()),
            _ => ItemRef::Index(index),
        }
    }

    pub fn backend_id(&self) -> Option<&str> {
        match self {
            ItemRef::Id(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemRef::Id(id) => write!(f, "{}", id),
            ItemRef::Index(idx) => write!(f, "idx-{}", idx),
            ItemRef::Unknown => Ok(()),
        }
    }
}

/// Composite key `orderId-itemRef-foodName-quantity`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey(String);

impl DedupKey {
    /// Item-level key
    pub fn for_item(order_id: &str, item: &ItemRef, food_name: &str, quantity: u32) -> Self {
        Self(format!("{}-{}-{}-{}", order_id, item, food_name, quantity))
    }

    /// Ticket-level key: `orderId-table-name:qty|name:qty` with lines sorted
    pub fn for_ticket<'a>(
        order_id: &str,
        table: &str,
        lines: impl IntoIterator<Item = (&'a str, u32)>,
    ) -> Self {
        let mut parts: Vec<String> = lines
            .into_iter()
            .map(|(name, qty)| format!("{}:{}", name, qty))
            .collect();
        parts.sort();
        Self(format!("{}-{}-{}", order_id, table, parts.join("|")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 去重键存储
#[derive(Debug)]
pub struct DedupKeyStore {
    keys: DashMap<DedupKey, Instant>,
    window: Duration,
}

impl DedupKeyStore {
    pub fn new(window: Duration) -> Self {
        Self {
            keys: DashMap::new(),
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    fn is_live(&self, reserved_at: Instant, now: Instant) -> bool {
        now.saturating_duration_since(reserved_at) < self.window
    }

    /// Reserve a key. `true` only if it was not already (live) present.
    pub fn reserve(&self, key: &DedupKey) -> bool {
        let now = Instant::now();
        match self.keys.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                if self.is_live(*entry.get(), now) {
                    false
                } else {
                    entry.insert(now);
                    true
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
        }
    }

    /// Mark a key as handled from an outside signal; no-op when already live.
    pub fn mark(&self, key: &DedupKey) {
        if !self.reserve(key) {
            tracing::trace!(key = %key, "Key already marked");
        }
    }

    /// Whether the key is currently reserved (not yet expired)
    pub fn contains(&self, key: &DedupKey) -> bool {
        let now = Instant::now();
        self.keys
            .get(key)
            .is_some_and(|reserved_at| self.is_live(*reserved_at, now))
    }

    /// Remove expired keys, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.keys.len();
        self.keys
            .retain(|_, reserved_at| self.is_live(*reserved_at, now));
        before.saturating_sub(self.keys.len())
    }

    /// Drop every key (shift boundary); nothing remains scheduled to expire.
    pub fn clear(&self) -> usize {
        let count = self.keys.len();
        self.keys.clear();
        count
    }

    /// Number of stored keys, expired-but-unpurged included
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of keys still inside the window
    pub fn live_count(&self) -> usize {
        let now = Instant::now();
        self.keys
            .iter()
            .filter(|entry| self.is_live(*entry.value(), now))
            .count()
    }

    /// Periodic purge loop (runs until shutdown)
    pub async fn purge_loop(self: Arc<Self>, every: Duration, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!("Dedup purge loop stopping");
                    break;
                }
                _ = interval.tick() => {
                    let purged = self.purge_expired();
                    if purged > 0 {
                        tracing::debug!(purged, remaining = self.len(), "Cleared expired dedup keys");
                    }
                }
            }
        }
    }
}

impl Default for DedupKeyStore {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_WINDOW)
    }
}
