//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`events`] - 实时事件入口 (push channel relay)
//! - [`print_queue`] - 打印队列统计、状态、清空
//! - [`settings`] - 打印设置和打印机列表

pub mod events;
pub mod health;
pub mod print_queue;
pub mod settings;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::{ServerError, ServerState};

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(events::router())
        .merge(print_queue::router())
        .merge(settings::router())
        .fallback(|| async { ServerError::NotFound })
}

/// Build the fully configured application
pub fn build_app(state: ServerState) -> Router {
    build_router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
