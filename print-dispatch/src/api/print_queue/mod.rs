//! Print Queue API Module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/print-queue", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/stats", get(handler::stats))
        .route("/status", get(handler::status))
        .route("/jobs", get(handler::jobs))
        .route("/clear", post(handler::clear))
}
