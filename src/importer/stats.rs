//! 导入任务的累计统计

use crate::accesslog::ParsedRecord;
use chrono::{DateTime, Utc};
use std::fmt;

/// 单个导入任务的累计统计，随每个批次一并写入 `import_job`
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JobStats {
    /// 已接受的记录数
    pub entries_total: u64,
    /// 已读取的行数（包括被拒绝的行）
    pub lines_processed: u64,
    /// 最早的记录时间
    pub from_time: Option<DateTime<Utc>>,
    /// 最晚的记录时间
    pub to_time: Option<DateTime<Utc>>,
}

impl JobStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 计入一条已接受的记录
    pub fn observe(&mut self, record: &ParsedRecord) {
        let time = record.datetime_utc();
        self.entries_total += 1;
        self.from_time = Some(self.from_time.map_or(time, |t| t.min(time)));
        self.to_time = Some(self.to_time.map_or(time, |t| t.max(time)));
    }

    /// 合并另一段统计：记录数相加，时间范围取并集，行数取较大值
    pub fn merge(&mut self, other: &JobStats) {
        self.entries_total += other.entries_total;
        self.lines_processed = self.lines_processed.max(other.lines_processed);

        if let Some(other_from) = other.from_time {
            self.from_time = Some(self.from_time.map_or(other_from, |t| t.min(other_from)));
        }
        if let Some(other_to) = other.to_time {
            self.to_time = Some(self.to_time.map_or(other_to, |t| t.max(other_to)));
        }
    }

    /// 是否没有接受任何记录
    pub fn is_empty(&self) -> bool {
        self.entries_total == 0
    }
}

impl fmt::Display for JobStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "记录: {}, 行数: {}",
            self.entries_total, self.lines_processed
        )?;

        if let (Some(from), Some(to)) = (self.from_time, self.to_time) {
            write!(f, ", 时间范围: {} ~ {}", from.to_rfc3339(), to.to_rfc3339())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accesslog::parse_line;

    fn at(time: &str) -> ParsedRecord {
        parse_line(&format!(
            r#"1.1.1.1 - - [{time}] "GET / HTTP/1.1" 200 1 "-" "-""#
        ))
        .unwrap()
    }

    #[test]
    fn test_observe_tracks_min_and_max() {
        let mut stats = JobStats::new();
        assert!(stats.is_empty());
        assert!(stats.from_time.is_none() && stats.to_time.is_none());

        let mid = at("10/Oct/2023:12:00:00 +0000");
        let early = at("10/Oct/2023:13:00:00 +0200");
        let late = at("10/Oct/2023:12:30:00 -0100");
        stats.observe(&mid);
        stats.observe(&early);
        stats.observe(&late);

        assert_eq!(stats.entries_total, 3);
        assert_eq!(stats.from_time, Some(early.datetime_utc()));
        assert_eq!(stats.to_time, Some(late.datetime_utc()));
        assert!(stats.from_time <= stats.to_time);
    }

    #[test]
    fn test_merge() {
        let mut a = JobStats::new();
        a.observe(&at("10/Oct/2023:12:00:00 +0000"));
        a.lines_processed = 10;

        let mut b = JobStats::new();
        b.observe(&at("09/Oct/2023:12:00:00 +0000"));
        b.observe(&at("11/Oct/2023:12:00:00 +0000"));
        b.lines_processed = 25;

        a.merge(&b);
        assert_eq!(a.entries_total, 3);
        assert_eq!(a.lines_processed, 25);
        assert_eq!(a.from_time, b.from_time);
        assert_eq!(a.to_time, b.to_time);

        // 合并空统计不改变时间范围
        let before = a.clone();
        a.merge(&JobStats::new());
        assert_eq!(a, before);
    }

    #[test]
    fn test_display() {
        let mut stats = JobStats::new();
        assert!(format!("{stats}").contains("记录: 0"));
        stats.observe(&at("10/Oct/2023:12:00:00 +0000"));
        assert!(format!("{stats}").contains("时间范围"));
    }
}
