//! 配置管理模块
//!
//! 提供统一的配置文件读取和管理功能

use crate::error::{ImportError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 每批提交的默认记录数
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// 默认的进度上报间隔（行）
pub const DEFAULT_PROGRESS_INTERVAL: usize = 100;

/// 主配置结构体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
    /// 导入配置
    #[serde(default)]
    pub import: ImportConfig,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// 是否启用控制台输出（默认关闭，日志只写文件，避免打断进度条）
    pub enable_stdout: bool,
    /// 日志输出目录
    pub log_dir: String,
    /// 日志级别 (trace, debug, info, warn, error)
    pub level: String,
}

/// 导入配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// SQLite 数据库文件路径
    pub db_path: String,
    /// 每个事务提交的记录数
    pub batch_size: usize,
    /// 每处理多少行上报一次进度
    pub progress_interval: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enable_stdout: false,
            log_dir: "logs".to_string(),
            level: "info".to_string(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            db_path: "accesslog.db".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl Config {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// 从字符串加载配置
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        match self.log.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ImportError::config(format!(
                    "无效的日志级别: {}",
                    self.log.level
                )));
            }
        }

        if self.import.batch_size == 0 {
            return Err(ImportError::config("batch_size 不能为0"));
        }

        if self.import.progress_interval == 0 {
            return Err(ImportError::config("progress_interval 不能为0"));
        }

        if self.import.db_path.trim().is_empty() {
            return Err(ImportError::config("db_path 不能为空"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.log.level = "invalid".to_string();
        assert!(config.validate().is_err());

        config.log.level = "info".to_string();
        config.import.batch_size = 0;
        assert!(config.validate().is_err());

        config.import.batch_size = 100;
        config.import.progress_interval = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed_config: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.log.level, parsed_config.log.level);
        assert_eq!(parsed_config.import.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::from_str("[import]\nbatch_size = 250\n").unwrap();
        assert_eq!(config.import.batch_size, 250);
        assert_eq!(config.import.progress_interval, DEFAULT_PROGRESS_INTERVAL);
        assert_eq!(config.log.level, "info");
    }
}
