//! Kitchen order shapes as served by the backend

use serde::{Deserialize, Serialize};

/// 厨房工作流状态 (backend state machine, consumed as input only)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum KitchenStatus {
    #[default]
    Pending,
    Preparing,
    Ready,
    Served,
    Cancelled,
}

impl KitchenStatus {
    /// Still on the kitchen's plate: neither ready, served nor cancelled.
    pub fn is_active(self) -> bool {
        !matches!(
            self,
            KitchenStatus::Ready | KitchenStatus::Served | KitchenStatus::Cancelled
        )
    }
}

impl std::fmt::Display for KitchenStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KitchenStatus::Pending => write!(f, "pending"),
            KitchenStatus::Preparing => write!(f, "preparing"),
            KitchenStatus::Ready => write!(f, "ready"),
            KitchenStatus::Served => write!(f, "served"),
            KitchenStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// 订单中的一道菜
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KitchenOrderItem {
    /// Backend item id; older payloads omit it
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub food_id: Option<String>,
    pub food_name: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kitchen_status: Option<KitchenStatus>,
    #[serde(default)]
    pub is_ready: bool,
    #[serde(default)]
    pub is_cancelled: bool,
}

impl KitchenOrderItem {
    /// Effective workflow status.
    ///
    /// Explicit `kitchenStatus` wins; legacy payloads fall back to the
    /// `isCancelled` / `isReady` flags.
    pub fn status(&self) -> KitchenStatus {
        if let Some(status) = self.kitchen_status {
            return status;
        }
        if self.is_cancelled {
            KitchenStatus::Cancelled
        } else if self.is_ready {
            KitchenStatus::Ready
        } else {
            KitchenStatus::Pending
        }
    }

    pub fn is_active(&self) -> bool {
        self.status().is_active()
    }
}

/// 一张桌子的厨房订单（full view of one order）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KitchenOrder {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub waiter_name: Option<String>,
    #[serde(default)]
    pub items: Vec<KitchenOrderItem>,
}

impl KitchenOrder {
    pub fn table_label(&self) -> &str {
        self.table_name.as_deref().unwrap_or("Noma'lum stol")
    }

    pub fn waiter_label(&self) -> &str {
        self.waiter_name.as_deref().unwrap_or("")
    }
}
