//! New-order alerts for the cook
//!
//! Not part of the print correctness contract: delivery failures are ignored.

use crate::printing::JobItem;
use async_trait::async_trait;
use serde::Serialize;

/// Items listed by name before the rest is summarised
const MAX_LISTED_ITEMS: usize = 3;

/// 新订单提醒
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderAlert {
    pub title: String,
    pub body: String,
    pub tag: &'static str,
    pub require_interaction: bool,
}

impl NewOrderAlert {
    pub fn new(table: &str, items: &[JobItem]) -> Self {
        let listed = items
            .iter()
            .take(MAX_LISTED_ITEMS)
            .map(|i| format!("{} x{}", i.food_name, i.quantity))
            .collect::<Vec<_>>()
            .join(", ");

        let body = if items.len() > MAX_LISTED_ITEMS {
            format!("{} va yana {} ta...", listed, items.len() - MAX_LISTED_ITEMS)
        } else if listed.is_empty() {
            format!("{} ta taom", items.len())
        } else {
            listed
        };

        Self {
            title: format!("Yangi buyurtma - {}", table),
            body,
            tag: "new-order",
            require_interaction: true,
        }
    }
}

/// Notification facility
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, alert: NewOrderAlert);
}

/// Notifier that writes alerts to the log
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, alert: NewOrderAlert) {
        tracing::info!(
            target: "notification",
            tag = alert.tag,
            "{}: {}",
            alert.title,
            alert.body
        );
    }
}
