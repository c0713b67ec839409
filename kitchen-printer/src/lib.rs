//! # kitchen-printer
//!
//! Printer transport for kitchen tickets - delivery only.
//!
//! ## Scope
//!
//! This crate handles HOW a ticket reaches paper:
//! - Ticket wire format for the local print server
//! - HTTP delivery (`POST /print/order`) with an idempotency key
//! - Print server health, printer listing and test page
//!
//! Business logic (WHEN and WHAT to print) stays in `print-dispatch`:
//! - Deduplication and snapshot reconciliation
//! - Job queue, retries, backend status sync
//!
//! ## Example
//!
//! ```ignore
//! use kitchen_printer::{HttpPrinterTransport, KitchenTicket, PrinterTransport, TicketLine};
//!
//! let transport = HttpPrinterTransport::new("http://localhost:4000")?;
//! let ticket = KitchenTicket::new("Kitchen-1", "OSHXONA", "T3", "W1", vec![
//!     TicketLine::new("Lagman", 2),
//! ], "job-O1-3f9a");
//! transport.print_ticket(&ticket).await?;
//! ```

mod error;
mod ticket;
mod transport;

// Re-exports
pub use error::{PrintError, PrintResult};
pub use ticket::{KitchenTicket, PrintAck, PrinterInfo, TestPrintRequest, TicketLine};
pub use transport::{HttpPrinterTransport, PrinterTransport};
