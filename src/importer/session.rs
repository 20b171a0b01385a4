//! 面向 SQLite 数据库文件的一次完整导入
//!
//! 参数校验通过之前不打开数据库。演练模式不会创建或修改数据库文件：
//! 文件已存在且包含导入表时以只读方式打开，仅用于查找项目；否则使用内存存储。

use crate::error::Result;
use crate::importer::events::ImportEvent;
use crate::importer::orchestrator::{ImportOptions, Importer, validate_invocation};
use crate::importer::report::ImportReport;
use crate::store::{LogStore, MemoryStore, SqliteStore};
use std::path::Path;

/// 将匹配的日志文件导入 `db_path`，每个事件先交给 `on_event`，再计入汇总
///
/// # Errors
/// 参数无效时返回配置错误，此时数据库文件不会被创建；
/// 数据库无法打开时返回存储错误。单个文件的失败记录在返回的汇总中。
pub fn import_to_database<P, F>(
    db_path: P,
    path_pattern: &str,
    project_name: &str,
    dry_run: bool,
    options: ImportOptions,
    mut on_event: F,
) -> Result<ImportReport>
where
    P: AsRef<Path>,
    F: FnMut(&ImportEvent),
{
    validate_invocation(path_pattern, project_name, &options)?;
    let db_path = db_path.as_ref();

    if !dry_run {
        let mut store = SqliteStore::open(db_path)?;
        return drive(&mut store, path_pattern, project_name, false, options, &mut on_event);
    }

    if db_path.exists() {
        let mut store = SqliteStore::open_read_only(db_path)?;
        if store.has_schema()? {
            return drive(&mut store, path_pattern, project_name, true, options, &mut on_event);
        }
    }

    #[cfg(feature = "logging")]
    tracing::debug!(
        "演练模式：数据库 {} 不存在或未初始化，使用内存存储",
        db_path.display()
    );
    let mut store = MemoryStore::new();
    drive(&mut store, path_pattern, project_name, true, options, &mut on_event)
}

fn drive<S, F>(
    store: &mut S,
    path_pattern: &str,
    project_name: &str,
    dry_run: bool,
    options: ImportOptions,
    on_event: &mut F,
) -> Result<ImportReport>
where
    S: LogStore,
    F: FnMut(&ImportEvent),
{
    let run = Importer::new(store)
        .with_options(options)
        .import(path_pattern, project_name, dry_run)?;

    let mut report = ImportReport::new();
    for event in run {
        on_event(&event);
        report.record(&event);
    }
    report.finish();
    Ok(report)
}
