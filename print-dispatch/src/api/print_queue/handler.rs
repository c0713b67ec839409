//! Print Queue API Handlers
//!
//! - 统计 (completed / failed / pending)
//! - 状态 (queue size, processing, printed keys)
//! - 当前队列中的任务
//! - 清空缓存 (交给事件入口执行)

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::core::{Result, ServerState};
use crate::printing::{IngestMessage, PrintJob, QueueStats, QueueStatus};

/// GET /api/print-queue/stats
pub async fn stats(State(state): State<ServerState>) -> Json<QueueStats> {
    Json(state.queue.stats())
}

/// GET /api/print-queue/status
pub async fn status(State(state): State<ServerState>) -> Json<QueueStatus> {
    Json(state.queue.status())
}

/// GET /api/print-queue/jobs
pub async fn jobs(State(state): State<ServerState>) -> Json<Vec<PrintJob>> {
    Json(state.queue.jobs())
}

#[derive(Debug, Serialize)]
pub struct ClearAccepted {
    pub accepted: bool,
}

/// POST /api/print-queue/clear
///
/// Runs on the ingest worker so it cannot interleave with an event.
pub async fn clear(State(state): State<ServerState>) -> Result<(StatusCode, Json<ClearAccepted>)> {
    state.submit(IngestMessage::ClearCache)?;
    tracing::info!("Print cache clear requested");
    Ok((StatusCode::ACCEPTED, Json(ClearAccepted { accepted: true })))
}
