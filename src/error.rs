//! 错误类型定义
//!
//! 这个模块定义了库中使用的所有错误类型，使用 thiserror 提供丰富的错误信息。

/// 访问日志导入的结果类型
pub type Result<T> = std::result::Result<T, ImportError>;

/// 访问日志导入错误类型
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// IO错误（文件打开、读取）
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite 错误
    #[error("SQLite错误: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// 文件匹配模式错误
    #[error("文件匹配模式错误: {0}")]
    Pattern(#[from] glob::PatternError),

    /// 配置文件解析错误
    #[error("配置解析错误: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// 配置文件序列化错误
    #[error("配置序列化错误: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 存储层错误（非 SQLite 实现）
    #[error("存储错误: {0}")]
    Store(String),

    /// 日志错误（仅在启用 logging feature 时可用）
    #[cfg(feature = "logging")]
    #[error("日志错误: {0}")]
    Log(#[from] crate::logging::LogError),

    /// 其他错误
    #[error("未知错误: {0}")]
    Other(String),
}

impl ImportError {
    /// 创建一个配置错误
    pub fn config<S: Into<String>>(message: S) -> Self {
        let message = message.into();
        #[cfg(feature = "logging")]
        {
            crate::logging::ensure_logger_initialized();
            tracing::error!("配置错误: {}", message);
        }
        Self::Config(message)
    }

    /// 创建一个存储错误
    pub fn store<S: Into<String>>(message: S) -> Self {
        let message = message.into();
        #[cfg(feature = "logging")]
        {
            crate::logging::ensure_logger_initialized();
            tracing::error!("存储错误: {}", message);
        }
        Self::Store(message)
    }

    /// 创建一个其他类型错误
    pub fn other<S: Into<String>>(message: S) -> Self {
        let message = message.into();
        #[cfg(feature = "logging")]
        {
            crate::logging::ensure_logger_initialized();
            tracing::error!("未知错误: {}", message);
        }
        Self::Other(message)
    }

    /// 检查是否为 IO 错误
    pub fn is_io_error(&self) -> bool {
        matches!(self, ImportError::Io(_))
    }

    /// 检查是否为配置错误
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ImportError::Config(_)
                | ImportError::Pattern(_)
                | ImportError::TomlDe(_)
        )
    }

    /// 检查是否为持久化错误（SQLite 或其他存储实现）
    pub fn is_store_error(&self) -> bool {
        matches!(self, ImportError::Sqlite(_) | ImportError::Store(_))
    }
}
