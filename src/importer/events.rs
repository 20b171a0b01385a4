//! 导入过程中产生的事件

use crate::error::ImportError;
use crate::importer::progress::Progress;
use crate::importer::stats::JobStats;
use std::fmt;
use std::path::PathBuf;

/// 一次导入运行按顺序产生的事件
#[derive(Debug)]
pub enum ImportEvent {
    /// 匹配模式没有找到任何可读文件，运行正常结束
    NoFiles { pattern: String },
    /// 项目已解析；演练模式下项目不存在时 `id` 为 `None`
    Project { id: Option<i64>, name: String },
    /// 文件不可读或不是普通文件，已跳过
    SkippedFile { path: PathBuf, reason: String },
    /// 开始处理文件
    FileStarted {
        path: PathBuf,
        import_job_id: Option<i64>,
        total_lines: u64,
    },
    Progress(Progress),
    /// 一个批次已提交
    BatchFlushed {
        path: PathBuf,
        import_job_id: i64,
        records: usize,
        entries_total: u64,
    },
    /// 文件完整导入（演练模式下为完整统计）
    FileCompleted {
        path: PathBuf,
        import_job_id: Option<i64>,
        stats: JobStats,
        flushes: usize,
    },
    /// 文件导入中止；`stats` 为中止前已提交的部分
    FileAborted {
        path: PathBuf,
        import_job_id: Option<i64>,
        stats: JobStats,
        error: ImportError,
    },
    /// 收到取消信号，运行结束
    Cancelled {
        path: Option<PathBuf>,
        import_job_id: Option<i64>,
        stats: JobStats,
    },
    /// 无法继续运行（例如项目无法创建）
    RunFailed { error: ImportError },
}

impl ImportEvent {
    /// 是否表示失败
    pub fn is_failure(&self) -> bool {
        matches!(self, ImportEvent::FileAborted { .. } | ImportEvent::RunFailed { .. })
    }
}

impl fmt::Display for ImportEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportEvent::NoFiles { pattern } => {
                write!(f, "没有找到匹配的文件: {pattern}")
            }
            ImportEvent::Project { id: Some(id), name } => {
                write!(f, "项目: {name} (ID: {id})")
            }
            ImportEvent::Project { id: None, name } => {
                write!(f, "项目: {name} (尚不存在)")
            }
            ImportEvent::SkippedFile { path, reason } => {
                write!(f, "跳过文件 {}: {reason}", path.display())
            }
            ImportEvent::FileStarted { path, total_lines, .. } => {
                write!(f, "开始处理文件: {} ({total_lines} 行)", path.display())
            }
            ImportEvent::Progress(p) => {
                write!(
                    f,
                    "{}: {}/{} ({:.1}%)",
                    p.file.display(),
                    p.lines_processed,
                    p.total_lines,
                    p.percent()
                )?;
                if let Some(eta) = p.eta_seconds {
                    write!(f, ", 剩余约 {eta:.0}s")?;
                }
                Ok(())
            }
            ImportEvent::BatchFlushed { records, entries_total, import_job_id, .. } => {
                write!(f, "任务 {import_job_id} 提交 {records} 条记录，累计 {entries_total} 条")
            }
            ImportEvent::FileCompleted { path, stats, .. } => {
                write!(f, "文件导入完成: {} - {stats}", path.display())
            }
            ImportEvent::FileAborted { path, error, stats, .. } => {
                write!(
                    f,
                    "文件导入中止: {} - {error} (已提交 {} 条)",
                    path.display(),
                    stats.entries_total
                )
            }
            ImportEvent::Cancelled { path: Some(path), stats, .. } => {
                write!(
                    f,
                    "导入已取消: {} (已提交 {} 条)",
                    path.display(),
                    stats.entries_total
                )
            }
            ImportEvent::Cancelled { path: None, .. } => write!(f, "导入已取消"),
            ImportEvent::RunFailed { error } => write!(f, "导入失败: {error}"),
        }
    }
}
