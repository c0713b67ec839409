//! Shared types for the kitchen print dispatcher
//!
//! Wire types pushed by the backend's real-time channel and the order
//! shapes the dispatcher reads from them. No I/O lives here.

pub mod kitchen;
pub mod util;

// Re-exports
pub use kitchen::{
    KitchenOrder, KitchenOrderItem, KitchenStatus, NewItem, NewItemsEvent, OrdersSnapshotEvent,
    RealtimeEvent, ShiftEvent, ShiftEventKind,
};
pub use serde::{Deserialize, Serialize};
