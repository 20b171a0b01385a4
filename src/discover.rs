//! 日志文件发现
//!
//! 将 glob 模式展开为可读的普通文件列表。没有匹配不是错误；
//! 不可读或非普通文件会被跳过并记录原因。

use crate::error::Result;
use glob::glob;
use std::fs::{self, File};
use std::path::PathBuf;

/// 被跳过的路径及原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPath {
    pub path: PathBuf,
    pub reason: String,
}

/// 文件发现结果，`files` 按 glob 的字典序排列
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub files: Vec<PathBuf>,
    pub skipped: Vec<SkippedPath>,
}

impl Discovery {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// 展开匹配模式
///
/// # Errors
/// 模式语法错误时返回 `ImportError::Pattern`。
pub fn discover(pattern: &str) -> Result<Discovery> {
    let mut discovery = Discovery::default();

    for entry in glob(pattern)? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                let path = e.path().to_path_buf();
                skip(&mut discovery, path, e.error().to_string());
                continue;
            }
        };

        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                skip(&mut discovery, path, "不是普通文件".to_string());
                continue;
            }
            Err(e) => {
                skip(&mut discovery, path, e.to_string());
                continue;
            }
        }

        if let Err(e) = File::open(&path) {
            skip(&mut discovery, path, e.to_string());
            continue;
        }

        discovery.files.push(path);
    }

    #[cfg(feature = "logging")]
    tracing::debug!(
        "模式 {} 匹配到 {} 个文件，跳过 {} 个",
        pattern,
        discovery.files.len(),
        discovery.skipped.len()
    );

    Ok(discovery)
}

fn skip(discovery: &mut Discovery, path: PathBuf, reason: String) {
    #[cfg(feature = "logging")]
    tracing::info!("跳过 {}: {}", path.display(), reason);
    discovery.skipped.push(SkippedPath { path, reason });
}
