//! Kitchen ticket wire format (local print server)

use serde::{Deserialize, Serialize};

/// One line on the ticket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TicketLine {
    pub food_name: String,
    pub quantity: u32,
}

impl TicketLine {
    pub fn new(food_name: impl Into<String>, quantity: u32) -> Self {
        Self {
            food_name: food_name.into(),
            quantity,
        }
    }
}

/// 厨房单 - body of `POST /print/order`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KitchenTicket {
    pub printer_name: String,
    pub restaurant_name: String,
    pub table_name: String,
    pub waiter_name: String,
    pub items: Vec<TicketLine>,
    /// RFC 3339 timestamp printed on the ticket
    pub created_at: String,
    /// Lets the print server collapse duplicate deliveries of one job
    pub idempotency_key: String,
}

impl KitchenTicket {
    pub fn new(
        printer_name: impl Into<String>,
        restaurant_name: impl Into<String>,
        table_name: impl Into<String>,
        waiter_name: impl Into<String>,
        items: Vec<TicketLine>,
        idempotency_key: impl Into<String>,
    ) -> Self {
        Self {
            printer_name: printer_name.into(),
            restaurant_name: restaurant_name.into(),
            table_name: table_name.into(),
            waiter_name: waiter_name.into(),
            items,
            created_at: String::new(),
            idempotency_key: idempotency_key.into(),
        }
    }

    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = created_at.into();
        self
    }
}

/// Body of `POST /print/test`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TestPrintRequest {
    pub printer_name: String,
    pub restaurant_name: String,
}

/// Print server reply `{success, error?, message?}`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrintAck {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Printer installed on the print server host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PrinterInfo {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub is_default: bool,
}
