//! 日志初始化和配置模块
//!
//! 这个模块提供了统一的日志初始化功能，使用 tracing 库。
//! 默认配置：info 级别，输出到控制台和 logs 目录，按天滚动。

use std::io;
use std::path::PathBuf;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, time::SystemTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// 日志配置结构体
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志级别
    pub level: Level,
    /// 日志文件目录
    pub log_dir: PathBuf,
    /// 是否输出到控制台
    pub enable_stdout: bool,
}

impl LogConfig {
    /// 创建新的日志配置，使用默认值
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置日志级别
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// 设置日志文件目录
    pub fn log_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.log_dir = dir.into();
        self
    }

    /// 设置是否输出到控制台
    pub fn enable_stdout(mut self, enable: bool) -> Self {
        self.enable_stdout = enable;
        self
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            log_dir: PathBuf::from("logs"),
            enable_stdout: true,
        }
    }
}

impl TryFrom<&crate::config::LogConfig> for LogConfig {
    type Error = LogError;

    fn try_from(cfg: &crate::config::LogConfig) -> LogResult<Self> {
        let level = cfg
            .level
            .parse::<Level>()
            .map_err(|_| LogError::Config(format!("无效的日志级别: {}", cfg.level)))?;
        Ok(Self {
            level,
            log_dir: PathBuf::from(&cfg.log_dir),
            enable_stdout: cfg.enable_stdout,
        })
    }
}

/// 自动初始化日志系统（仅初始化一次）
static INIT_LOGGER: Once = Once::new();

/// 确保日志系统已初始化
///
/// 首次调用时使用默认配置初始化，后续调用不会重复初始化；
/// 初始化失败（比如已经被调用方初始化过）会被安静地忽略。
pub(crate) fn ensure_logger_initialized() {
    INIT_LOGGER.call_once(|| {
        let _ = init_default_logging();
    });
}

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),
    #[error("日志配置错误: {0}")]
    Config(String),
    #[error("日志初始化错误: {0}")]
    Init(String),
}

/// 日志初始化结果
pub type LogResult<T> = Result<T, LogError>;

/// 初始化日志系统
///
/// - 环境变量 `RUST_LOG` 优先于配置中的级别
/// - 控制台输出可通过 `enable_stdout` 关闭
/// - 文件输出按天滚动，写入 `log_dir`
///
/// 重复初始化不是错误，直接返回 `Ok(())`。
///
/// # Examples
///
/// ```no_run
/// use accesslog_import::logging::{init_logging, LogConfig};
/// use tracing::Level;
///
/// let config = LogConfig::new().level(Level::DEBUG).log_dir("logs");
/// init_logging(config).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> LogResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    std::fs::create_dir_all(&config.log_dir)?;

    let subscriber = Registry::default().with(env_filter);

    let console_layer = config.enable_stdout.then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_timer(SystemTime)
            .with_target(true)
            .with_ansi(true)
    });

    let file_appender =
        tracing_appender::rolling::daily(&config.log_dir, "accesslog");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_timer(SystemTime)
        .with_target(true)
        .with_thread_ids(true)
        .with_ansi(false);

    match subscriber.with(console_layer).with(file_layer).try_init() {
        Ok(()) => {
            // guard 被丢弃时 appender 会停止写入
            std::mem::forget(guard);
            tracing::info!(
                "日志系统初始化完成 - 级别 {}, 目录 {}",
                config.level,
                config.log_dir.display()
            );
            Ok(())
        }
        Err(_) => Ok(()),
    }
}

/// 使用默认配置初始化日志系统
///
/// ```no_run
/// use accesslog_import::logging::init_default_logging;
///
/// init_default_logging().unwrap();
/// ```
pub fn init_default_logging() -> LogResult<()> {
    init_logging(LogConfig::default())
}
