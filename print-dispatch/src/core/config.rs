use crate::printing::QueueConfig;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// 打印调度配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (设置文件、日志) |
/// | HTTP_PORT | 3100 | HTTP 服务端口 |
/// | PRINT_SERVER_URL | http://localhost:4000 | 本地打印服务 |
/// | BACKEND_API_URL | https://server.kepket.uz | 后端 API |
/// | BACKEND_TOKEN | - | 后端 Bearer token |
/// | LOG_LEVEL | info | 日志级别 |
/// | DEDUP_WINDOW_SECS | 300 | 去重窗口(秒) |
/// | MAX_RETRIES | 3 | 每个任务的打印尝试次数 |
/// | RETRY_DELAY_MS | 2000 | 重试间隔(毫秒) |
/// | PROCESS_INTERVAL_MS | 100 | 处理器 tick(毫秒) |
/// | SUPPRESSION_WINDOW_MS | 2000 | new-items 之后快照抑制窗口(毫秒) |
/// | PRINT_TIMEOUT_MS | 10000 | 单次打印调用超时(毫秒) |
///
/// # 示例
///
/// ```ignore
/// PRINT_SERVER_URL=http://192.168.1.20:4000 HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储设置文件、日志
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 本地打印服务地址
    pub print_server_url: String,
    /// 后端 API 地址
    pub backend_api_url: String,
    /// 后端认证 token
    pub backend_token: Option<String>,
    pub log_level: String,

    // === 队列参数 ===
    pub dedup_window_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub process_interval_ms: u64,
    pub suppression_window_ms: u64,
    pub print_timeout_ms: u64,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: env_or("HTTP_PORT", 3100),
            print_server_url: std::env::var("PRINT_SERVER_URL")
                .unwrap_or_else(|_| "http://localhost:4000".into()),
            backend_api_url: std::env::var("BACKEND_API_URL")
                .unwrap_or_else(|_| "https://server.kepket.uz".into()),
            backend_token: std::env::var("BACKEND_TOKEN").ok().filter(|t| !t.is_empty()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),

            dedup_window_secs: env_or("DEDUP_WINDOW_SECS", 300),
            max_retries: env_or("MAX_RETRIES", 3),
            retry_delay_ms: env_or("RETRY_DELAY_MS", 2000),
            process_interval_ms: env_or("PROCESS_INTERVAL_MS", 100),
            suppression_window_ms: env_or("SUPPRESSION_WINDOW_MS", 2000),
            print_timeout_ms: env_or("PRINT_TIMEOUT_MS", 10000),
        }
    }

    /// 使用自定义工作目录和端口覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    pub fn settings_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("print-settings.json")
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    pub fn dedup_window(&self) -> Duration {
        Duration::from_secs(self.dedup_window_secs)
    }

    pub fn process_interval(&self) -> Duration {
        Duration::from_millis(self.process_interval_ms.max(1))
    }

    pub fn suppression_window(&self) -> Duration {
        Duration::from_millis(self.suppression_window_ms)
    }

    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            max_retries: self.max_retries.max(1),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            print_timeout: Duration::from_millis(self.print_timeout_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_durations() {
        let mut config = Config::with_overrides("/tmp/dispatch", 0);
        config.max_retries = 0;
        config.retry_delay_ms = 1500;
        config.process_interval_ms = 0;

        let queue = config.queue_config();
        assert_eq!(queue.max_retries, 1);
        assert_eq!(queue.retry_delay, Duration::from_millis(1500));
        assert_eq!(config.process_interval(), Duration::from_millis(1));
        assert_eq!(
            config.settings_path(),
            PathBuf::from("/tmp/dispatch/print-settings.json")
        );
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        assert_eq!(env_or("PRINT_DISPATCH_TEST_UNSET_VAR", 42u16), 42);
    }
}
