//! 访问日志解析模块
//!
//! 提供 Combined/Common Log Format 单行解析、记录类型定义和工具函数

pub mod parser;
pub mod types;
pub mod utils;

// 重新导出核心类型和函数
pub use parser::{LineParser, parse_line};
pub use types::ParsedRecord;
pub use utils::{path_extension, split_request_target};
