//! Printer transports for delivering kitchen tickets
//!
//! Supports:
//! - Local print server over HTTP (`/print/order`, `/print/test`, `/health`, `/printers`)

use crate::error::{PrintError, PrintResult};
use crate::ticket::{KitchenTicket, PrintAck, PrinterInfo, TestPrintRequest};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Header carrying the ticket's idempotency key
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Trait for printer transports
#[async_trait]
pub trait PrinterTransport: Send + Sync {
    /// Deliver one ticket. `Ok` only when the printer side acknowledged success.
    async fn print_ticket(&self, ticket: &KitchenTicket) -> PrintResult<PrintAck>;

    /// Check if the print server is reachable
    async fn is_online(&self) -> bool;

    /// Printers available for selection
    async fn list_printers(&self) -> PrintResult<Vec<PrinterInfo>>;

    /// Print the server's test page on one printer
    async fn print_test(&self, printer_name: &str, restaurant_name: &str)
    -> PrintResult<PrintAck>;
}

/// Local print server transport
///
/// The print server renders ESC/POS itself; we only post structured tickets.
#[derive(Debug, Clone)]
pub struct HttpPrinterTransport {
    client: Client,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct PrintersResponse {
    #[serde(default)]
    printers: Vec<PrinterInfo>,
}

impl HttpPrinterTransport {
    /// Create a transport for a print server base URL (e.g. `http://localhost:4000`)
    pub fn new(base_url: &str) -> PrintResult<Self> {
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(PrintError::InvalidConfig(format!(
                "Invalid print server URL: {}",
                base_url
            )));
        }

        let client = Client::builder()
            .build()
            .map_err(|e| PrintError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(10),
        })
    }

    /// Set per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the print server base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn map_send_error(&self, e: reqwest::Error) -> PrintError {
        if e.is_timeout() {
            PrintError::Timeout(format!("{}: {}", self.base_url, e))
        } else if e.is_connect() {
            PrintError::Connection(format!("{}: {}", self.base_url, e))
        } else {
            PrintError::Http(e)
        }
    }

    /// Probe `/health` with a short timeout
    pub async fn check_connection(&self) -> bool {
        let request = self
            .client
            .get(self.url("/health"))
            .timeout(Duration::from_secs(3));

        match request.send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Print server health check failed");
                false
            }
        }
    }

    /// Parse `{success, error?}`; `Ok` only on `success: true`
    async fn read_ack(resp: reqwest::Response) -> PrintResult<PrintAck> {
        let status = resp.status();
        let ack: PrintAck = match resp.json().await {
            Ok(ack) => ack,
            Err(e) if !status.is_success() => {
                return Err(PrintError::Rejected(format!("HTTP {}: {}", status, e)));
            }
            Err(e) => return Err(PrintError::Http(e)),
        };

        if !ack.success {
            let reason = ack
                .error
                .clone()
                .unwrap_or_else(|| format!("print server returned HTTP {}", status));
            warn!(error = %reason, "Print server rejected request");
            return Err(PrintError::Rejected(reason));
        }
        Ok(ack)
    }
}

#[async_trait]
impl PrinterTransport for HttpPrinterTransport {
    #[instrument(skip(self, ticket), fields(
        url = %self.base_url,
        idempotency_key = %ticket.idempotency_key,
        items = ticket.items.len()
    ))]
    async fn print_ticket(&self, ticket: &KitchenTicket) -> PrintResult<PrintAck> {
        if ticket.printer_name.is_empty() {
            return Err(PrintError::NoPrinterSelected);
        }

        info!(printer = %ticket.printer_name, "Sending ticket to print server");

        let resp = self
            .client
            .post(self.url("/print/order"))
            .header(IDEMPOTENCY_HEADER, &ticket.idempotency_key)
            .timeout(self.timeout)
            .json(ticket)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let ack = Self::read_ack(resp).await?;
        info!("Ticket printed");
        Ok(ack)
    }

    async fn is_online(&self) -> bool {
        self.check_connection().await
    }

    async fn list_printers(&self) -> PrintResult<Vec<PrinterInfo>> {
        let resp = self
            .client
            .get(self.url("/printers"))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let body: PrintersResponse = resp.json().await?;
        debug!(count = body.printers.len(), "Printers listed");
        Ok(body.printers)
    }

    #[instrument(skip(self), fields(url = %self.base_url))]
    async fn print_test(
        &self,
        printer_name: &str,
        restaurant_name: &str,
    ) -> PrintResult<PrintAck> {
        if printer_name.is_empty() {
            return Err(PrintError::NoPrinterSelected);
        }

        let body = TestPrintRequest {
            printer_name: printer_name.to_string(),
            restaurant_name: restaurant_name.to_string(),
        };
        let resp = self
            .client
            .post(self.url("/print/test"))
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let ack = Self::read_ack(resp).await?;
        info!(printer = %printer_name, "Test page printed");
        Ok(ack)
    }
}
