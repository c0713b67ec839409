//! Error types for the printer transport

use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// Print server unreachable
    #[error("Connection failed: {0}")]
    Connection(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Print server answered `success: false`
    #[error("Print rejected: {0}")]
    Rejected(String),

    /// Timeout waiting for the print server
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid transport configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// No printer chosen in local settings
    #[error("No printer selected")]
    NoPrinterSelected,
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
