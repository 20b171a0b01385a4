//! 导入运行汇总

use crate::importer::events::ImportEvent;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// 一次导入运行的汇总信息
#[derive(Debug, Default, Clone)]
pub struct ImportReport {
    /// 完整导入的文件数
    pub files_completed: usize,
    /// 中止的文件数
    pub files_aborted: usize,
    /// 跳过的文件数
    pub files_skipped: usize,
    /// 已接受（非演练模式下即已提交）的记录数
    pub entries_accepted: u64,
    /// 已读取的行数
    pub lines_processed: u64,
    /// 没有匹配到文件
    pub no_files: bool,
    /// 运行被取消
    pub cancelled: bool,
    /// 失败的文件及原因；运行级失败的路径为空
    pub failures: Vec<(Option<PathBuf>, String)>,
    pub start_time: Option<Instant>,
    pub end_time: Option<Instant>,
}

impl ImportReport {
    /// 创建新的汇总，记录开始时间
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// 计入一个事件
    pub fn record(&mut self, event: &ImportEvent) {
        match event {
            ImportEvent::NoFiles { .. } => self.no_files = true,
            ImportEvent::SkippedFile { .. } => self.files_skipped += 1,
            ImportEvent::FileCompleted { stats, .. } => {
                self.files_completed += 1;
                self.entries_accepted += stats.entries_total;
                self.lines_processed += stats.lines_processed;
            }
            ImportEvent::FileAborted { path, stats, error, .. } => {
                self.files_aborted += 1;
                self.entries_accepted += stats.entries_total;
                self.lines_processed += stats.lines_processed;
                self.failures.push((Some(path.clone()), error.to_string()));
            }
            ImportEvent::Cancelled { stats, .. } => {
                self.cancelled = true;
                self.entries_accepted += stats.entries_total;
                self.lines_processed += stats.lines_processed;
            }
            ImportEvent::RunFailed { error } => {
                self.failures.push((None, error.to_string()));
            }
            ImportEvent::Project { .. }
            | ImportEvent::FileStarted { .. }
            | ImportEvent::Progress(_)
            | ImportEvent::BatchFlushed { .. } => {}
        }
    }

    /// 标记运行结束
    pub fn finish(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// 没有任何失败且未被取消
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }

    pub fn duration(&self) -> Option<Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end.duration_since(start)),
            _ => None,
        }
    }

    /// 每秒导入记录数
    pub fn entries_per_second(&self) -> Option<f64> {
        self.duration().map(|d| {
            if d.as_secs_f64() > 0.0 {
                self.entries_accepted as f64 / d.as_secs_f64()
            } else {
                0.0
            }
        })
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.no_files {
            return write!(f, "没有找到文件");
        }

        write!(
            f,
            "完成: {} 个文件, 中止: {}, 跳过: {}, 记录: {}, 行数: {}",
            self.files_completed,
            self.files_aborted,
            self.files_skipped,
            self.entries_accepted,
            self.lines_processed
        )?;

        if let Some(duration) = self.duration() {
            write!(f, ", 耗时: {:.2}s", duration.as_secs_f64())?;
            if let Some(rate) = self.entries_per_second() {
                write!(f, ", 速度: {rate:.2} 条/秒")?;
            }
        }

        if self.cancelled {
            write!(f, " (已取消)")?;
        }
        Ok(())
    }
}
