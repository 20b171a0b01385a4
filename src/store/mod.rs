//! 存储层
//!
//! 导入流程只通过 [`LogStore`] 与 [`StoreTransaction`] 访问存储：
//! 批次提交时由调用方开启事务，插入记录并更新任务统计后提交；
//! 事务对象未提交即被丢弃时，其中的所有写入都会回滚。

pub mod memory;
pub mod sqlite;
pub mod types;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use types::{
    ActivityEntry, EntryDetail, EntryFilter, ImportJob, LogEntry, NewImportJob,
    Project,
};

use crate::accesslog::ParsedRecord;
use crate::error::Result;
use crate::importer::stats::JobStats;

/// 导入流程使用的存储接口
pub trait LogStore {
    /// 事务上下文，生命周期受调用方控制
    type Tx<'t>: StoreTransaction
    where
        Self: 't;

    /// 按名称查找项目，不存在时返回 `None`
    fn find_project(&self, name: &str) -> Result<Option<Project>>;

    /// 查找或创建项目，重复调用返回同一项目
    fn get_or_create_project(&mut self, name: &str) -> Result<Project>;

    /// 创建导入任务并返回其 ID，该写入独立提交
    fn create_import_job(&mut self, job: &NewImportJob<'_>) -> Result<i64>;

    /// 开启一个事务
    fn begin(&mut self) -> Result<Self::Tx<'_>>;
}

/// 单个事务内的写操作
pub trait StoreTransaction {
    /// 批量插入记录，返回插入的行数
    fn insert_entries(
        &mut self,
        import_job_id: i64,
        records: &[ParsedRecord],
    ) -> Result<usize>;

    /// 写入任务的累计统计
    fn update_job_stats(&mut self, import_job_id: i64, stats: &JobStats) -> Result<()>;

    /// 标记任务已完整导入
    fn mark_processed(&mut self, import_job_id: i64) -> Result<()>;

    /// 提交事务
    fn commit(self) -> Result<()>;
}

/// 计数写入数据库时统一转换为 INTEGER
pub(crate) fn count_to_sql(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}
