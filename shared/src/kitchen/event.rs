//! Real-time events pushed by the backend

use super::order::KitchenOrder;
use serde::{Deserialize, Serialize};

/// An item the backend explicitly labelled as newly added
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    #[serde(rename = "_id", alias = "itemId", default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(alias = "name", default = "default_food_name")]
    pub food_name: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_food_name() -> String {
    "Noma'lum".to_string()
}

fn default_quantity() -> u32 {
    1
}

/// "new-items": explicit additions for one order plus the full current list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewItemsEvent {
    #[serde(default)]
    pub order: Option<KitchenOrder>,
    #[serde(default)]
    pub all_orders: Vec<KitchenOrder>,
    #[serde(default)]
    pub new_items: Vec<NewItem>,
}

impl NewItemsEvent {
    /// The order the new items belong to.
    ///
    /// Falls back to the last order of the full list when the backend sent
    /// `order: null`.
    pub fn target_order(&self) -> Option<&KitchenOrder> {
        self.order.as_ref().or_else(|| self.all_orders.last())
    }
}

/// "orders-snapshot": the authoritative full order list, no "new" marker
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrdersSnapshotEvent {
    #[serde(default)]
    pub all_orders: Vec<KitchenOrder>,
}

/// 班次生命周期
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShiftEventKind {
    Opened,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShiftEvent {
    pub kind: ShiftEventKind,
    #[serde(default)]
    pub shift_id: Option<String>,
}

/// Envelope for everything the real-time channel delivers
///
/// ```json
/// { "event": "orders-snapshot", "data": { "allOrders": [] } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum RealtimeEvent {
    #[serde(rename = "new-items")]
    NewItems(NewItemsEvent),
    #[serde(rename = "orders-snapshot")]
    OrdersSnapshot(OrdersSnapshotEvent),
    #[serde(rename = "shift")]
    Shift(ShiftEvent),
}

impl RealtimeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RealtimeEvent::NewItems(_) => "new-items",
            RealtimeEvent::OrdersSnapshot(_) => "orders-snapshot",
            RealtimeEvent::Shift(_) => "shift",
        }
    }
}
