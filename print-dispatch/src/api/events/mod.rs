//! Real-time event relay
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/events | POST | `{"event": "new-items" \| "orders-snapshot" \| "shift", "data": {...}}` |
//!
//! Events are handed to the ingest worker; the reply only confirms acceptance.

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde::Serialize;
use shared::RealtimeEvent;

use crate::core::{Result, ServerState};
use crate::printing::IngestMessage;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/events", post(ingest))
}

#[derive(Debug, Serialize)]
pub struct Accepted {
    pub accepted: bool,
    pub event: &'static str,
}

async fn ingest(
    State(state): State<ServerState>,
    Json(event): Json<RealtimeEvent>,
) -> Result<(StatusCode, Json<Accepted>)> {
    let name = event.name();
    tracing::debug!(event = name, "Realtime event received");
    state.submit(IngestMessage::Event(event))?;
    Ok((
        StatusCode::ACCEPTED,
        Json(Accepted {
            accepted: true,
            event: name,
        }),
    ))
}
