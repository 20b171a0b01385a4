//! 内存存储实现
//!
//! 不依赖数据库，用于测试，以及数据库尚不存在时的演练模式。
//! 支持在指定批次的提交上注入失败，以验证回滚与“已提交批次保留”的行为。

use super::types::{ImportJob, LogEntry, NewImportJob, Project};
use super::{LogStore, StoreTransaction, count_to_sql};
use crate::accesslog::ParsedRecord;
use crate::error::{ImportError, Result};
use crate::importer::stats::JobStats;
use chrono::Utc;

#[derive(Debug, Default)]
pub struct MemoryStore {
    projects: Vec<Project>,
    jobs: Vec<ImportJob>,
    entries: Vec<LogEntry>,
    /// 每次成功提交的插入批次大小
    committed_batches: Vec<usize>,
    /// 已尝试提交的插入批次数
    attempted_batches: usize,
    /// 第 n 个（从 1 开始）插入批次提交时失败
    fail_on_batch: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 让第 `n` 个（从 1 开始计数）包含插入的事务在提交时失败
    pub fn fail_on_batch(mut self, n: usize) -> Self {
        self.fail_on_batch = Some(n);
        self
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn jobs(&self) -> &[ImportJob] {
        &self.jobs
    }

    pub fn job(&self, id: i64) -> Option<&ImportJob> {
        self.jobs.iter().find(|job| job.id == id)
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn entries_for_job(&self, import_job_id: i64) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.import_job_id == import_job_id)
            .count()
    }

    /// 已成功提交的插入批次大小（按提交顺序）
    pub fn committed_batches(&self) -> &[usize] {
        &self.committed_batches
    }

    fn job_mut(&mut self, id: i64) -> Result<&mut ImportJob> {
        self.jobs
            .iter_mut()
            .find(|job| job.id == id)
            .ok_or_else(|| ImportError::store(format!("导入任务不存在: {id}")))
    }
}

impl LogStore for MemoryStore {
    type Tx<'t> = MemoryTransaction<'t>;

    fn find_project(&self, name: &str) -> Result<Option<Project>> {
        Ok(self.projects.iter().find(|p| p.name == name).cloned())
    }

    fn get_or_create_project(&mut self, name: &str) -> Result<Project> {
        if let Some(project) = self.find_project(name)? {
            return Ok(project);
        }
        let project = Project {
            id: self.projects.len() as i64 + 1,
            name: name.to_string(),
        };
        self.projects.push(project.clone());
        Ok(project)
    }

    fn create_import_job(&mut self, job: &NewImportJob<'_>) -> Result<i64> {
        if !self.projects.iter().any(|p| p.id == job.project_id) {
            return Err(ImportError::store(format!("项目不存在: {}", job.project_id)));
        }
        let id = self.jobs.len() as i64 + 1;
        self.jobs.push(ImportJob {
            id,
            project_id: job.project_id,
            filename: job.filename.to_string(),
            imported_at: Utc::now(),
            from_time: None,
            to_time: None,
            entries_total: 0,
            file_lines_count: count_to_sql(job.file_lines_count),
            lines_processed: 0,
            is_processed: false,
        });
        Ok(id)
    }

    fn begin(&mut self) -> Result<MemoryTransaction<'_>> {
        Ok(MemoryTransaction {
            store: self,
            entries: Vec::new(),
            job_stats: Vec::new(),
            processed: Vec::new(),
        })
    }
}

/// 内存事务：写入先暂存，提交时一次性应用
pub struct MemoryTransaction<'s> {
    store: &'s mut MemoryStore,
    entries: Vec<(i64, ParsedRecord)>,
    job_stats: Vec<(i64, JobStats)>,
    processed: Vec<i64>,
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn insert_entries(
        &mut self,
        import_job_id: i64,
        records: &[ParsedRecord],
    ) -> Result<usize> {
        self.store.job_mut(import_job_id)?;
        self.entries
            .extend(records.iter().map(|r| (import_job_id, r.clone())));
        Ok(records.len())
    }

    fn update_job_stats(&mut self, import_job_id: i64, stats: &JobStats) -> Result<()> {
        self.store.job_mut(import_job_id)?;
        self.job_stats.push((import_job_id, stats.clone()));
        Ok(())
    }

    fn mark_processed(&mut self, import_job_id: i64) -> Result<()> {
        self.store.job_mut(import_job_id)?;
        self.processed.push(import_job_id);
        Ok(())
    }

    fn commit(self) -> Result<()> {
        let store = self.store;

        if !self.entries.is_empty() {
            store.attempted_batches += 1;
            if store.fail_on_batch == Some(store.attempted_batches) {
                return Err(ImportError::store(format!(
                    "第 {} 个批次提交失败（注入）",
                    store.attempted_batches
                )));
            }
            store.committed_batches.push(self.entries.len());
        }

        for (import_job_id, record) in self.entries {
            let id = store.entries.len() as i64 + 1;
            store.entries.push(LogEntry {
                id,
                import_job_id,
                datetime: record.datetime_utc(),
                ip: record.ip,
                method: record.method,
                path: record.path,
                query: record.query,
                status: record.status,
                referer: record.referer,
                user_agent: record.user_agent,
            });
        }

        for (import_job_id, stats) in self.job_stats {
            let job = store.job_mut(import_job_id)?;
            job.entries_total = count_to_sql(stats.entries_total);
            job.lines_processed = count_to_sql(stats.lines_processed);
            job.from_time = stats.from_time;
            job.to_time = stats.to_time;
        }

        for import_job_id in self.processed {
            store.job_mut(import_job_id)?.is_processed = true;
        }

        Ok(())
    }
}
