//! Backend Order API client (print status sync only)

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("Backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Calls this subsystem makes against the backend
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Bulk "mark items printed". Fire-and-forget from the queue's view.
    async fn mark_items_printed(&self, item_ids: &[String]) -> BackendResult<()>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PrinterStatusRequest<'a> {
    item_ids: &'a [String],
    status: &'static str,
}

/// HTTP client for the backend
#[derive(Debug, Clone)]
pub struct HttpBackendApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackendApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> BackendResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Set the authentication token
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    fn auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {}", t))
    }
}

#[async_trait]
impl BackendApi for HttpBackendApi {
    async fn mark_items_printed(&self, item_ids: &[String]) -> BackendResult<()> {
        let url = format!("{}/api/kitchen-orders/printer-status", self.base_url);
        let mut request = self.client.patch(&url).json(&PrinterStatusRequest {
            item_ids,
            status: "printed",
        });

        if let Some(auth) = self.auth_header() {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body });
        }

        tracing::debug!(count = item_ids.len(), "Items marked as printed");
        Ok(())
    }
}
