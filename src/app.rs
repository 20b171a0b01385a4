use crate::{Cli, Command};
use accesslog_import::{
    accesslog::parser::TIMESTAMP_FORMAT,
    config::Config,
    importer::{ImportEvent, ImportOptions, import_to_database},
    store::{EntryFilter, SqliteStore},
};
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

const DEFAULT_CONFIG_FILE: &str = "accesslog.toml";

pub fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(db) = &cli.db {
        config.import.db_path = db.display().to_string();
    }

    #[cfg(feature = "logging")]
    {
        let log_config = accesslog_import::logging::LogConfig::try_from(&config.log)?;
        accesslog_import::logging::init_logging(log_config)?;
    }

    match cli.command {
        Command::InitDb => {
            SqliteStore::open(&config.import.db_path)?;
            println!("数据库初始化完成: {}", config.import.db_path);
            Ok(ExitCode::SUCCESS)
        }
        Command::Import { path, project, dry_run } => {
            run_import(&config, &path, project.as_deref().unwrap_or(""), dry_run)
        }
        Command::Projects => {
            let store = SqliteStore::open(&config.import.db_path)?;
            print_json(&store.list_projects()?)
        }
        Command::Project { id } => {
            let store = SqliteStore::open(&config.import.db_path)?;
            match store.get_project(id)? {
                Some(project) => print_json(&project),
                None => {
                    eprintln!("项目不存在: {id}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Jobs { project } => {
            let store = SqliteStore::open(&config.import.db_path)?;
            print_json(&store.list_import_jobs(project)?)
        }
        Command::Ip { ip, project, job, detailed } => {
            let store = SqliteStore::open(&config.import.db_path)?;
            let filter = EntryFilter { project_id: project, import_job_id: job };
            print_json(&store.activity_by_ip(&ip, &filter, detailed)?)
        }
        Command::Range { from, to, project, job } => {
            let store = SqliteStore::open(&config.import.db_path)?;
            let filter = EntryFilter { project_id: project, import_job_id: job };
            let entries = store.entries_by_time_range(
                parse_time(&from)?,
                parse_time(&to)?,
                &filter,
            )?;
            print_json(&entries)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            Ok(Config::from_file(DEFAULT_CONFIG_FILE)?)
        }
        None => Ok(Config::default()),
    }
}

fn run_import(config: &Config, pattern: &str, project: &str, dry_run: bool) -> Result<ExitCode> {
    let mut bar: Option<ProgressBar> = None;
    let mut started = false;

    let report = import_to_database(
        &config.import.db_path,
        pattern,
        project,
        dry_run,
        ImportOptions::from(&config.import),
        |event| {
            if !started {
                started = true;
                println!("开始导入项目 '{}'...", project.trim());
                if dry_run {
                    println!("演练模式：不会写入任何数据");
                }
            }
            match event {
                ImportEvent::FileStarted { total_lines, .. } => {
                    println!("{event}");
                    bar = Some(file_progress_bar(*total_lines));
                }
                ImportEvent::Progress(progress) => {
                    if let Some(bar) = &bar {
                        bar.set_position(progress.lines_processed);
                        bar.set_message(format_eta(progress.eta_seconds));
                    }
                }
                ImportEvent::BatchFlushed { .. } => {}
                ImportEvent::FileCompleted { .. }
                | ImportEvent::FileAborted { .. }
                | ImportEvent::Cancelled { .. } => {
                    if let Some(bar) = bar.take() {
                        bar.finish_and_clear();
                    }
                    println!("{event}");
                }
                _ => println!("{event}"),
            }
        },
    )?;

    println!("{report}");
    if report.is_success() {
        println!("导入完成");
        Ok(ExitCode::SUCCESS)
    } else {
        for (path, error) in &report.failures {
            match path {
                Some(path) => eprintln!("  {}: {error}", path.display()),
                None => eprintln!("  {error}"),
            }
        }
        Ok(ExitCode::FAILURE)
    }
}

fn file_progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template(" {pos}/{len} [{wide_bar:.cyan/blue}] {percent:>3}% {elapsed_precise} / ETA: {msg}")
    {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar.set_message("?");
    bar
}

fn format_eta(eta: Option<f64>) -> String {
    match eta {
        Some(secs) => {
            let secs = secs.round() as u64;
            format!("{:02}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
        }
        None => "?".to_string(),
    }
}

fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, TIMESTAMP_FORMAT))
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| anyhow!("无法解析时间: {value}"))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(ExitCode::SUCCESS)
}
