//! 存储层数据类型

use chrono::{DateTime, Utc};
use serde::Serialize;

/// 项目，名称唯一
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
}

/// 导入任务：每个日志文件每次导入对应一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportJob {
    pub id: i64,
    pub project_id: i64,
    /// 文件名（不含目录）
    pub filename: String,
    pub imported_at: DateTime<Utc>,
    /// 已提交记录中的最早时间
    pub from_time: Option<DateTime<Utc>>,
    /// 已提交记录中的最晚时间
    pub to_time: Option<DateTime<Utc>>,
    pub entries_total: i64,
    /// 预扫描得到的文件总行数
    pub file_lines_count: i64,
    pub lines_processed: i64,
    /// 文件完整读取且全部批次提交后才为 true
    pub is_processed: bool,
}

/// 创建导入任务所需的字段
#[derive(Debug, Clone)]
pub struct NewImportJob<'a> {
    pub project_id: i64,
    pub filename: &'a str,
    pub file_lines_count: u64,
}

/// 已入库的访问日志记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub id: i64,
    pub import_job_id: i64,
    pub ip: String,
    pub datetime: DateTime<Utc>,
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub status: u16,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
}

/// 按 IP 查询活动时返回的记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityEntry {
    pub import_job_id: i64,
    pub datetime: DateTime<Utc>,
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub status: u16,
    /// 仅在 detailed 查询时填充
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub detail: Option<EntryDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryDetail {
    pub referer: Option<String>,
    pub user_agent: Option<String>,
}

impl ActivityEntry {
    pub fn from_entry(entry: LogEntry, detailed: bool) -> Self {
        let detail = detailed.then(|| EntryDetail {
            referer: entry.referer,
            user_agent: entry.user_agent,
        });
        Self {
            import_job_id: entry.import_job_id,
            datetime: entry.datetime,
            method: entry.method,
            path: entry.path,
            query: entry.query,
            status: entry.status,
            detail,
        }
    }
}

/// 读查询的可选过滤条件
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub project_id: Option<i64>,
    pub import_job_id: Option<i64>,
}

impl EntryFilter {
    pub fn project(mut self, project_id: i64) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn import_job(mut self, import_job_id: i64) -> Self {
        self.import_job_id = Some(import_job_id);
        self
    }
}
