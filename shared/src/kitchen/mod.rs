//! Kitchen order and real-time event types
//!
//! - Orders: the backend's full view of each table's order
//! - Events: the two overlapping push channels plus shift lifecycle

pub mod event;
pub mod order;

// Re-exports
pub use event::{NewItem, NewItemsEvent, OrdersSnapshotEvent, RealtimeEvent, ShiftEvent, ShiftEventKind};
pub use order::{KitchenOrder, KitchenOrderItem, KitchenStatus};
