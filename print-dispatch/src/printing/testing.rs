//! In-crate fakes for the external interfaces

use crate::services::{BackendApi, BackendError, BackendResult, NewOrderAlert, Notifier};
use async_trait::async_trait;
use kitchen_printer::{
    KitchenTicket, PrintAck, PrintError, PrintResult, PrinterInfo, PrinterTransport,
};
use parking_lot::Mutex;
use reqwest::StatusCode;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::time::Duration;

#[derive(Debug, Clone, Copy)]
enum Script {
    Succeed,
    Fail,
    /// Fail the first N calls, then succeed
    FailFirst(usize),
    /// Never answer
    Hang,
}

/// Printer transport with a scripted answer and an in-flight counter
#[derive(Debug)]
pub struct ScriptedTransport {
    script: Script,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    tickets: Mutex<Vec<KitchenTicket>>,
}

impl ScriptedTransport {
    fn with_script(script: Script, delay: Duration) -> Self {
        Self {
            script,
            delay,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            tickets: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::with_script(Script::Succeed, Duration::ZERO)
    }

    pub fn failing() -> Self {
        Self::with_script(Script::Fail, Duration::ZERO)
    }

    pub fn failing_then_ok(failures: usize) -> Self {
        Self::with_script(Script::FailFirst(failures), Duration::ZERO)
    }

    pub fn hanging() -> Self {
        Self::with_script(Script::Hang, Duration::ZERO)
    }

    pub fn slow(delay: Duration) -> Self {
        Self::with_script(Script::Succeed, delay)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn tickets(&self) -> Vec<KitchenTicket> {
        self.tickets.lock().clone()
    }
}

#[async_trait]
impl PrinterTransport for ScriptedTransport {
    async fn print_ticket(&self, ticket: &KitchenTicket) -> PrintResult<PrintAck> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.tickets.lock().push(ticket.clone());

        match self.script {
            Script::Hang => std::future::pending::<()>().await,
            _ if !self.delay.is_zero() => tokio::time::sleep(self.delay).await,
            _ => {}
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.script {
            Script::Fail => Err(PrintError::Connection("printer offline".to_string())),
            Script::FailFirst(n) if call < n => {
                Err(PrintError::Rejected("paper jam".to_string()))
            }
            _ => Ok(PrintAck {
                success: true,
                error: None,
                message: Some("printed".to_string()),
            }),
        }
    }

    async fn is_online(&self) -> bool {
        !matches!(self.script, Script::Fail | Script::Hang)
    }

    async fn list_printers(&self) -> PrintResult<Vec<PrinterInfo>> {
        Ok(vec![PrinterInfo {
            name: "XP-80".to_string(),
            display_name: "Kitchen".to_string(),
            is_default: true,
        }])
    }

    async fn print_test(
        &self,
        printer_name: &str,
        _restaurant_name: &str,
    ) -> PrintResult<PrintAck> {
        match self.script {
            Script::Succeed | Script::FailFirst(_) => Ok(PrintAck {
                success: true,
                error: None,
                message: Some(format!("test page on {}", printer_name)),
            }),
            Script::Fail | Script::Hang => {
                Err(PrintError::Connection("printer offline".to_string()))
            }
        }
    }
}

/// Backend fake recording every "mark printed" batch
#[derive(Debug, Default)]
pub struct RecordingBackend {
    fail: AtomicBool,
    batches: Mutex<Vec<Vec<String>>>,
}

impl RecordingBackend {
    pub fn fail_all(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().clone()
    }
}

#[async_trait]
impl BackendApi for RecordingBackend {
    async fn mark_items_printed(&self, item_ids: &[String]) -> BackendResult<()> {
        self.batches.lock().push(item_ids.to_vec());
        if self.fail.load(Ordering::SeqCst) {
            return Err(BackendError::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: "maintenance".to_string(),
            });
        }
        Ok(())
    }
}

/// Notifier fake keeping every alert
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<NewOrderAlert>>,
}

impl RecordingNotifier {
    pub fn alerts(&self) -> Vec<NewOrderAlert> {
        self.alerts.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, alert: NewOrderAlert) {
        self.alerts.lock().push(alert);
    }
}
