//! 访问日志单行解析器
//!
//! 每一行独立解析：与固定的 Combined Log Format 正则匹配，拆分请求目标，
//! 过滤静态资源，并解析 `10/Oct/2023:13:55:36 -0700` 格式的时间戳。
//!
//! ## 拒绝规则
//!
//! 以下情况返回 `None`，调用方不计数、不入库、不报错：
//! - 行不匹配格式（括号结构错误、方法不是大写字母等）
//! - 路径扩展名存在且不是 `php`（css、js、图片等静态资源）
//! - 时间戳无法解析
//! - 状态码超出范围
//!
//! ```rust
//! use accesslog_import::accesslog::parse_line;
//!
//! let line = r#"127.0.0.1 - - [10/Oct/2023:13:55:36 -0700] "GET /index.php?a=1 HTTP/1.1" 200 2326 "-" "Mozilla/5.0""#;
//! let record = parse_line(line).unwrap();
//! assert_eq!(record.path, "/index.php");
//! assert_eq!(record.query.as_deref(), Some("a=1"));
//! assert!(record.referer.is_none());
//! ```

use crate::accesslog::types::ParsedRecord;
use crate::accesslog::utils::{is_dynamic_path, split_request_target};
use chrono::DateTime;
use lazy_static::lazy_static;
use regex::Regex;

/// 日志时间戳格式
pub const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

lazy_static! {
    // 1: IP  2: 时间  3: 方法  4: 请求目标  5: 状态码  6: Referer  7: User-Agent
    static ref ACCESS_LOG_RE: Regex = Regex::new(
        r#"^(\S+) \S+ \S+ \[([^\]]+)\] "([A-Z]+) (.+?) HTTP/[0-9.]+" (\d+) (?:\d+|-)(?: "([^"]*)" "([^"]*)")?"#
    )
    .expect("access log regex");
}

/// 访问日志行解析器（无状态）
#[derive(Debug, Default, Clone, Copy)]
pub struct LineParser;

impl LineParser {
    pub fn new() -> Self {
        Self
    }

    /// 解析单行日志，被拒绝的行返回 `None`
    pub fn parse(&self, raw_line: &str) -> Option<ParsedRecord> {
        parse_line(raw_line)
    }
}

/// 解析单行日志，被拒绝的行返回 `None`
pub fn parse_line(raw_line: &str) -> Option<ParsedRecord> {
    let line = raw_line.trim_end_matches(['\r', '\n']);
    let caps = ACCESS_LOG_RE.captures(line)?;

    let (path, query) = split_request_target(&caps[4]);
    if !is_dynamic_path(path) {
        return None;
    }

    let datetime = DateTime::parse_from_str(&caps[2], TIMESTAMP_FORMAT).ok()?;
    let status = caps[5].parse::<u16>().ok()?;

    let referer = caps
        .get(6)
        .map(|m| m.as_str())
        .filter(|r| *r != "-")
        .map(str::to_string);
    let user_agent = caps.get(7).map(|m| m.as_str().to_string());

    Some(ParsedRecord {
        ip: caps[1].to_string(),
        datetime,
        method: caps[3].to_string(),
        path: path.to_string(),
        query: query.map(str::to_string),
        status,
        referer,
        user_agent,
    })
}
