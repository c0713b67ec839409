//! Print Dispatch - 厨房打印调度
//!
//! # 架构概述
//!
//! 接收后端推送的订单事件，决定哪些菜需要出单，并保证每道菜只打印一次：
//!
//! - **去重** (`printing::dedup`): 窗口期内的菜品键
//! - **对账** (`printing::reconciler`): 全量快照 → 新增菜品
//! - **队列** (`printing::queue`, `printing::processor`): FIFO、单飞、重试
//! - **事件入口** (`printing::ingest`): new-items / orders-snapshot / shift
//! - **外部接口** (`services`): 后端状态同步、本地设置、提醒
//! - **HTTP API** (`api`): 事件转发、队列统计、设置
//!
//! # 模块结构
//!
//! ```text
//! print-dispatch/src/
//! ├── core/          # 配置、状态、错误、后台任务
//! ├── printing/      # 调度核心
//! ├── services/      # 后端、设置、提醒
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 日志
//! ```

pub mod api;
pub mod core;
pub mod printing;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use core::{BackgroundTasks, Config, Server, ServerError, ServerState, TaskKind};
pub use printing::{
    DedupKey, DedupKeyStore, EventIngestor, IngestMessage, PrintJob, PrintProcessor, PrintQueue,
    QueueConfig, SnapshotReconciler,
};
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境：加载 .env、创建工作目录、初始化日志
pub fn setup_environment() -> anyhow::Result<Config> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    std::fs::create_dir_all(&config.work_dir)?;
    let log_dir = config.log_dir();
    std::fs::create_dir_all(&log_dir)?;

    init_logger_with_file(Some(&config.log_level), Some(&log_dir));
    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
    ____       _       __
   / __ \_____(_)___  / /_
  / /_/ / ___/ / __ \/ __/
 / ____/ /  / / / / / /_
/_/   /_/  /_/_/ /_/\__/
        ____  _                  __       __
       / __ \(_)________  ____ _/ /______/ /_
      / / / / / ___/ __ \/ __ `/ __/ ___/ __ \
     / /_/ / (__  ) /_/ / /_/ / /_/ /__/ / / /
    /_____/_/____/ .___/\__,_/\__/\___/_/ /_/
                /_/
"#
    );
}
