use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

/// 单行访问日志解析结果，提交后成为 `log_entry` 表中的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedRecord {
    /// 客户端 IP
    pub ip: String,
    /// 请求时间（保留日志中的时区偏移）
    pub datetime: DateTime<FixedOffset>,
    /// HTTP 方法
    pub method: String,
    /// 请求路径（不含查询串）
    pub path: String,
    /// 查询串（不含 `?`）
    pub query: Option<String>,
    /// 响应状态码
    pub status: u16,
    /// 来源页，`-` 视为空
    pub referer: Option<String>,
    /// User-Agent，Common Log Format 行没有该字段
    pub user_agent: Option<String>,
}

impl ParsedRecord {
    /// 归一化到 UTC 的请求时间，用于存储与排序
    pub fn datetime_utc(&self) -> DateTime<Utc> {
        self.datetime.with_timezone(&Utc)
    }
}
