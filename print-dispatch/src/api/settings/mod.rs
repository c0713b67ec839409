//! Settings API Module
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/settings | GET | 当前打印设置 |
//! | /api/settings | PUT | 更新打印设置 |
//! | /api/printers | GET | 打印服务上的打印机 |
//! | /api/printers/test | POST | 在选中的打印机上打印测试页 |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/settings", get(handler::get).put(handler::update))
        .route("/api/printers", get(handler::printers))
        .route("/api/printers/test", post(handler::print_test))
}
