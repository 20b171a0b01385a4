//! 批量入库
//!
//! 已接受的记录先进入缓冲区，攒满一批后在一个事务里插入记录并更新任务统计，
//! 两者同时提交或同时回滚。提交失败时缓冲区内的记录不会出现在存储中，
//! 之前已提交的批次保持不变。演练模式不写存储，只累计统计。

use crate::accesslog::ParsedRecord;
use crate::error::Result;
use crate::importer::stats::JobStats;
use crate::store::{LogStore, StoreTransaction};

#[derive(Debug)]
pub struct BatchIngestor {
    /// 演练模式下为 `None`
    import_job_id: Option<i64>,
    batch_size: usize,
    buffer: Vec<ParsedRecord>,
    /// 缓冲区内记录的统计
    pending: JobStats,
    /// 已提交（演练模式下为已计数）的统计
    committed: JobStats,
    flushes: usize,
}

impl BatchIngestor {
    pub fn new(import_job_id: i64, batch_size: usize) -> Self {
        Self::with_job(Some(import_job_id), batch_size)
    }

    /// 演练模式：不写入任何数据
    pub fn dry_run(batch_size: usize) -> Self {
        Self::with_job(None, batch_size)
    }

    fn with_job(import_job_id: Option<i64>, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            import_job_id,
            batch_size,
            buffer: Vec::with_capacity(if import_job_id.is_some() { batch_size } else { 0 }),
            pending: JobStats::new(),
            committed: JobStats::new(),
            flushes: 0,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.import_job_id.is_none()
    }

    pub fn import_job_id(&self) -> Option<i64> {
        self.import_job_id
    }

    /// 已提交的统计
    pub fn stats(&self) -> &JobStats {
        &self.committed
    }

    /// 已提交的批次数
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// 缓冲区中尚未提交的记录数
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// 加入一条记录；缓冲区满时立即提交，返回提交的记录数
    pub fn push<S: LogStore>(
        &mut self,
        store: &mut S,
        record: ParsedRecord,
        lines_processed: u64,
    ) -> Result<Option<usize>> {
        if self.is_dry_run() {
            self.committed.observe(&record);
            self.committed.lines_processed = lines_processed;
            return Ok(None);
        }

        self.pending.observe(&record);
        self.buffer.push(record);

        if self.buffer.len() >= self.batch_size {
            return self.flush(store, lines_processed).map(Some);
        }
        Ok(None)
    }

    /// 提交缓冲区中的记录，返回提交的记录数（缓冲区为空时为 0）
    pub fn flush<S: LogStore>(&mut self, store: &mut S, lines_processed: u64) -> Result<usize> {
        let Some(import_job_id) = self.import_job_id else {
            return Ok(0);
        };
        if self.buffer.is_empty() {
            return Ok(0);
        }

        let mut next = self.committed.clone();
        next.merge(&self.pending);
        next.lines_processed = lines_processed;

        let mut tx = store.begin()?;
        tx.insert_entries(import_job_id, &self.buffer)?;
        tx.update_job_stats(import_job_id, &next)?;
        tx.commit()?;

        let flushed = self.buffer.len();
        self.buffer.clear();
        self.pending = JobStats::new();
        self.committed = next;
        self.flushes += 1;

        #[cfg(feature = "logging")]
        tracing::debug!(
            "任务 {} 第 {} 批提交完成: {} 条记录, 累计 {} 条",
            import_job_id,
            self.flushes,
            flushed,
            self.committed.entries_total
        );

        Ok(flushed)
    }

    /// 文件读完后调用：提交剩余记录，写入最终行数并标记任务已完成
    pub fn finalize<S: LogStore>(&mut self, store: &mut S, lines_processed: u64) -> Result<JobStats> {
        self.flush(store, lines_processed)?;
        self.committed.lines_processed = lines_processed;

        if let Some(import_job_id) = self.import_job_id {
            let mut tx = store.begin()?;
            tx.update_job_stats(import_job_id, &self.committed)?;
            tx.mark_processed(import_job_id)?;
            tx.commit()?;
        }

        Ok(self.committed.clone())
    }
}
