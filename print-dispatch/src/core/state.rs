use std::sync::Arc;
use std::time::{Duration, Instant};

use kitchen_printer::{HttpPrinterTransport, PrinterTransport};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::{Config, ServerError};
use crate::printing::{DedupKeyStore, EventIngestor, IngestMessage, PrintProcessor, PrintQueue};
use crate::services::{BackendApi, HttpBackendApi, LogNotifier, Notifier, SettingsStore};

/// Ingest channel capacity
const INGEST_CHANNEL_CAPACITY: usize = 256;

/// How often expired dedup keys are physically removed
const DEDUP_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Backend request timeout
const BACKEND_TIMEOUT: Duration = Duration::from_secs(10);

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | dedup | 去重键存储 |
/// | queue | 打印队列 |
/// | settings | 本地打印设置 |
/// | transport | 打印传输 |
/// | backend | 后端 API |
/// | notifier | 新订单提醒 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub dedup: Arc<DedupKeyStore>,
    pub queue: Arc<PrintQueue>,
    pub settings: Arc<SettingsStore>,
    pub transport: Arc<dyn PrinterTransport>,
    pub backend: Arc<dyn BackendApi>,
    pub notifier: Arc<dyn Notifier>,
    ingest_tx: mpsc::Sender<IngestMessage>,
    /// Taken once by the ingest worker
    ingest_rx: Arc<Mutex<Option<mpsc::Receiver<IngestMessage>>>>,
    started_at: Instant,
}

impl ServerState {
    /// 按配置创建真实组件
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        let settings = SettingsStore::load(config.settings_path())?;
        let transport = HttpPrinterTransport::new(&config.print_server_url)?
            .with_timeout(config.queue_config().print_timeout);
        let backend = HttpBackendApi::new(config.backend_api_url.clone(), BACKEND_TIMEOUT)?
            .with_token(config.backend_token.clone());

        Ok(Self::with_components(
            config.clone(),
            Arc::new(settings),
            Arc::new(transport),
            Arc::new(backend),
            Arc::new(LogNotifier::new()),
        ))
    }

    /// 使用注入的组件创建状态（测试用）
    pub fn with_components(
        config: Config,
        settings: Arc<SettingsStore>,
        transport: Arc<dyn PrinterTransport>,
        backend: Arc<dyn BackendApi>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let dedup = Arc::new(DedupKeyStore::new(config.dedup_window()));
        let queue = Arc::new(PrintQueue::new(dedup.clone(), config.queue_config()));
        let (ingest_tx, ingest_rx) = mpsc::channel(INGEST_CHANNEL_CAPACITY);

        Self {
            config,
            dedup,
            queue,
            settings,
            transport,
            backend,
            notifier,
            ingest_tx,
            ingest_rx: Arc::new(Mutex::new(Some(ingest_rx))),
            started_at: Instant::now(),
        }
    }

    /// 启动后台任务: 事件入口、打印处理器、去重清理
    pub fn start_background_tasks(&self, tasks: &mut BackgroundTasks) {
        let Some(ingest_rx) = self.ingest_rx.lock().take() else {
            tracing::warn!("Background tasks already started");
            return;
        };

        let ingestor = EventIngestor::new(
            self.queue.clone(),
            self.settings.clone(),
            self.notifier.clone(),
        )
        .with_suppression_window(self.config.suppression_window());
        tasks.spawn(
            "event_ingestor",
            TaskKind::Worker,
            ingestor.run(ingest_rx, tasks.shutdown_token()),
        );

        let processor = PrintProcessor::new(
            self.queue.clone(),
            self.transport.clone(),
            self.backend.clone(),
            self.settings.clone(),
        )
        .with_interval(self.config.process_interval());
        tasks.spawn(
            "print_processor",
            TaskKind::Periodic,
            processor.run(tasks.shutdown_token()),
        );

        tasks.spawn(
            "dedup_purge",
            TaskKind::Periodic,
            self.dedup
                .clone()
                .purge_loop(DEDUP_PURGE_INTERVAL, tasks.shutdown_token()),
        );
    }

    /// 把消息交给事件入口（不等待处理结果）
    pub fn submit(&self, message: IngestMessage) -> Result<(), ServerError> {
        self.ingest_tx.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => ServerError::Unavailable("ingest queue is full".into()),
            TrySendError::Closed(_) => ServerError::Unavailable("ingest worker stopped".into()),
        })
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
