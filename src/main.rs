use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod app;

/// Web 访问日志导入与查询
#[derive(Debug, Parser)]
#[command(name = "accesslog-cli", version, about)]
pub struct Cli {
    /// 配置文件路径（默认读取当前目录下的 accesslog.toml，不存在则使用默认配置）
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite 数据库路径，覆盖配置文件中的 db_path
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 初始化数据库表结构
    InitDb,
    /// 导入访问日志
    Import {
        /// 日志文件路径，支持通配符
        path: String,
        /// 项目名
        #[arg(long)]
        project: Option<String>,
        /// 只解析统计，不写入数据库
        #[arg(long)]
        dry_run: bool,
    },
    /// 列出项目
    Projects,
    /// 查看项目
    Project { id: i64 },
    /// 列出导入任务
    Jobs {
        #[arg(long)]
        project: Option<i64>,
    },
    /// 查询某个 IP 的访问记录
    Ip {
        ip: String,
        #[arg(long)]
        project: Option<i64>,
        #[arg(long)]
        job: Option<i64>,
        /// 同时输出 referer 和 user-agent
        #[arg(long)]
        detailed: bool,
    },
    /// 查询时间范围内的访问记录（RFC 3339 或日志时间格式）
    Range {
        from: String,
        to: String,
        #[arg(long)]
        project: Option<i64>,
        #[arg(long)]
        job: Option<i64>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    app::run(cli)
}
