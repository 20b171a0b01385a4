//! Web 访问日志导入库
//!
//! 将 Combined/Common Log Format 访问日志按项目和导入任务写入 SQLite，
//! 并提供按 IP、按时间范围的查询。

// 核心模块 - 始终可用
pub mod accesslog;
pub mod config;
pub mod discover;
pub mod error;
pub mod importer;
pub mod store;

// 日志模块 - 需要 logging 功能
#[cfg(feature = "logging")]
pub mod logging;

pub use error::{ImportError, Result};

/// 常用类型
pub mod prelude {
    pub use crate::accesslog::{LineParser, ParsedRecord, parse_line};
    pub use crate::config::Config;
    pub use crate::error::{ImportError, Result};
    pub use crate::importer::{
        ImportEvent, ImportOptions, ImportReport, ImportRun, Importer, JobStats,
        Progress, import_to_database,
    };
    pub use crate::store::{
        EntryFilter, LogStore, MemoryStore, SqliteStore, StoreTransaction,
    };
}
