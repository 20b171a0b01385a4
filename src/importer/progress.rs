//! 进度与剩余时间估算
//!
//! 总行数来自对文件的一次完整预扫描；剩余时间按已处理速率线性外推。

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// 单个文件的进度快照
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub lines_processed: u64,
    pub total_lines: u64,
    pub file: PathBuf,
    /// 剩余秒数；尚无速率时为 `None`
    pub eta_seconds: Option<f64>,
}

impl Progress {
    /// 完成百分比（0~100）
    pub fn percent(&self) -> f64 {
        if self.total_lines == 0 {
            100.0
        } else {
            (self.lines_processed as f64 / self.total_lines as f64 * 100.0).min(100.0)
        }
    }
}

/// 线性外推剩余时间：`rate = processed / elapsed`，`eta = (total - processed) / rate`
#[must_use]
pub fn estimate_eta(processed: u64, total: u64, elapsed: Duration) -> Option<f64> {
    let secs = elapsed.as_secs_f64();
    if processed == 0 || secs <= 0.0 {
        return None;
    }
    let rate = processed as f64 / secs;
    Some(total.saturating_sub(processed) as f64 / rate)
}

/// 统计文件行数：换行符个数，文件非空且不以换行结尾时再加一
pub fn count_lines<P: AsRef<Path>>(path: P) -> io::Result<u64> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut count = 0u64;
    let mut last_byte = None;

    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            break;
        }
        count += buf.iter().filter(|&&b| b == b'\n').count() as u64;
        last_byte = buf.last().copied();
        let len = buf.len();
        reader.consume(len);
    }

    if last_byte.is_some_and(|b| b != b'\n') {
        count += 1;
    }
    Ok(count)
}

/// 按固定间隔产生进度快照，最后一行总会上报
#[derive(Debug)]
pub struct ProgressEstimator {
    file: PathBuf,
    total: u64,
    processed: u64,
    interval: u64,
    last_reported: u64,
    started: Instant,
}

impl ProgressEstimator {
    pub fn new<P: Into<PathBuf>>(file: P, total: u64, interval: usize) -> Self {
        Self {
            file: file.into(),
            total,
            processed: 0,
            interval: interval.max(1) as u64,
            last_reported: 0,
            started: Instant::now(),
        }
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// 记录一行，达到上报间隔或最后一行时返回进度
    pub fn record_line(&mut self) -> Option<Progress> {
        let elapsed = self.started.elapsed();
        self.record_line_at(elapsed)
    }

    /// 与 [`record_line`](Self::record_line) 相同，但使用给定的耗时
    pub fn record_line_at(&mut self, elapsed: Duration) -> Option<Progress> {
        self.processed += 1;
        if self.processed % self.interval == 0 || self.processed == self.total {
            Some(self.snapshot(elapsed))
        } else {
            None
        }
    }

    /// 文件读完时调用；最后一行尚未上报过则补报一次
    pub fn finish(&mut self) -> Option<Progress> {
        let elapsed = self.started.elapsed();
        self.finish_at(elapsed)
    }

    pub fn finish_at(&mut self, elapsed: Duration) -> Option<Progress> {
        (self.processed != self.last_reported).then(|| self.snapshot(elapsed))
    }

    fn snapshot(&mut self, elapsed: Duration) -> Progress {
        self.last_reported = self.processed;
        // 预扫描后文件可能又被追加，总数不小于已处理数
        let total = self.total.max(self.processed);
        Progress {
            lines_processed: self.processed,
            total_lines: total,
            file: self.file.clone(),
            eta_seconds: estimate_eta(self.processed, total, elapsed),
        }
    }
}
