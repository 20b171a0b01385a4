//! SQLite 存储实现
//!
//! 表结构：
//!
//! ```text
//! project     (id, name UNIQUE)
//! import_job  (id, project_id → project, filename, imported_at, from_time, to_time,
//!              entries_total, file_lines_count, lines_processed, is_processed)
//! log_entry   (id, import_job_id → import_job, ip, datetime, method, path,
//!              query, status, referer, user_agent)
//! ```
//!
//! 所有时间均以 UTC 存储，文本顺序即时间顺序。

use super::types::{
    ActivityEntry, EntryFilter, ImportJob, LogEntry, NewImportJob, Project,
};
use super::{LogStore, StoreTransaction, count_to_sql};
use crate::accesslog::ParsedRecord;
use crate::error::{ImportError, Result};
use crate::importer::stats::JobStats;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, ToSql, params};
use std::path::Path;

/// 单条 INSERT 语句最多包含的行数（9 个参数/行，低于 SQLite 默认 999 个变量上限）
const MAX_ROWS_PER_STATEMENT: usize = 100;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS project (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS import_job (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id INTEGER NOT NULL,
        filename TEXT NOT NULL,
        imported_at DATETIME NOT NULL,
        from_time DATETIME,
        to_time DATETIME,
        entries_total INTEGER NOT NULL DEFAULT 0,
        file_lines_count INTEGER NOT NULL DEFAULT 0,
        lines_processed INTEGER NOT NULL DEFAULT 0,
        is_processed INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY (project_id) REFERENCES project(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS log_entry (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        import_job_id INTEGER NOT NULL,
        ip TEXT NOT NULL,
        datetime DATETIME NOT NULL,
        method TEXT NOT NULL,
        path TEXT NOT NULL,
        query TEXT,
        status INTEGER NOT NULL,
        referer TEXT,
        user_agent TEXT,
        FOREIGN KEY (import_job_id) REFERENCES import_job(id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_log_entry_import_job_id ON log_entry (import_job_id)",
    "CREATE INDEX IF NOT EXISTS idx_log_entry_ip ON log_entry (ip)",
    "CREATE INDEX IF NOT EXISTS idx_log_entry_datetime ON log_entry (datetime)",
    "CREATE INDEX IF NOT EXISTS idx_import_job_project_id ON import_job (project_id)",
];

const IMPORT_JOB_COLUMNS: &str = "id, project_id, filename, imported_at, from_time, to_time, entries_total, file_lines_count, lines_processed, is_processed";

const LOG_ENTRY_COLUMNS: &str = "e.id, e.import_job_id, e.ip, e.datetime, e.method, e.path, e.query, e.status, e.referer, e.user_agent";

/// SQLite 存储
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// 打开（或创建）数据库文件并初始化表结构
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        #[cfg(feature = "logging")]
        tracing::info!("打开SQLite数据库: {}", path.as_ref().display());

        Self::from_connection(Connection::open(path)?)
    }

    /// 以只读方式打开已有数据库，不初始化表结构，也不会创建文件
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        #[cfg(feature = "logging")]
        tracing::info!("以只读方式打开SQLite数据库: {}", path.as_ref().display());

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// 数据库中是否已有全部导入表
    pub fn has_schema(&self) -> Result<bool> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master
             WHERE type = 'table' AND name IN ('project', 'import_job', 'log_entry')",
            [],
            |row| row.get(0),
        )?;
        Ok(tables == 3)
    }

    /// 使用内存数据库，主要用于测试
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// 包装已有连接，开启外键约束并初始化表结构
    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        let mut store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// 在一个事务中创建所有表和索引（可重复执行）
    pub fn init_schema(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        for statement in SCHEMA {
            tx.execute(statement, [])?;
        }
        tx.commit()?;

        #[cfg(feature = "logging")]
        tracing::debug!("SQLite表结构初始化完成");
        Ok(())
    }

    /// 列出所有项目
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM project ORDER BY id")?;
        let rows = stmt.query_map([], project_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// 按 ID 获取项目
    pub fn get_project(&self, id: i64) -> Result<Option<Project>> {
        Ok(self
            .conn
            .query_row("SELECT id, name FROM project WHERE id = ?1", [id], project_from_row)
            .optional()?)
    }

    /// 列出导入任务，可按项目过滤
    pub fn list_import_jobs(&self, project_id: Option<i64>) -> Result<Vec<ImportJob>> {
        let sql = format!(
            "SELECT {IMPORT_JOB_COLUMNS} FROM import_job WHERE (?1 IS NULL OR project_id = ?1) ORDER BY id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([project_id], import_job_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// 按 ID 获取导入任务
    pub fn get_import_job(&self, id: i64) -> Result<Option<ImportJob>> {
        let sql = format!("SELECT {IMPORT_JOB_COLUMNS} FROM import_job WHERE id = ?1");
        Ok(self.conn.query_row(&sql, [id], import_job_from_row).optional()?)
    }

    /// 某个 IP 的访问记录，按时间升序
    pub fn activity_by_ip(
        &self,
        ip: &str,
        filter: &EntryFilter,
        detailed: bool,
    ) -> Result<Vec<ActivityEntry>> {
        let sql = format!(
            "SELECT {LOG_ENTRY_COLUMNS} FROM log_entry e
             JOIN import_job j ON j.id = e.import_job_id
             WHERE e.ip = ?1
               AND (?2 IS NULL OR j.project_id = ?2)
               AND (?3 IS NULL OR e.import_job_id = ?3)
             ORDER BY e.datetime, e.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![ip, filter.project_id, filter.import_job_id],
            log_entry_from_row,
        )?;
        let entries = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries
            .into_iter()
            .map(|entry| ActivityEntry::from_entry(entry, detailed))
            .collect())
    }

    /// 时间范围内（闭区间）的访问记录，按时间升序
    pub fn entries_by_time_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        filter: &EntryFilter,
    ) -> Result<Vec<LogEntry>> {
        let sql = format!(
            "SELECT {LOG_ENTRY_COLUMNS} FROM log_entry e
             JOIN import_job j ON j.id = e.import_job_id
             WHERE e.datetime >= ?1 AND e.datetime <= ?2
               AND (?3 IS NULL OR j.project_id = ?3)
               AND (?4 IS NULL OR e.import_job_id = ?4)
             ORDER BY e.datetime, e.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![from, to, filter.project_id, filter.import_job_id],
            log_entry_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// 某个导入任务已入库的记录数
    pub fn count_entries(&self, import_job_id: i64) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM log_entry WHERE import_job_id = ?1",
            [import_job_id],
            |row| row.get(0),
        )?)
    }
}

impl LogStore for SqliteStore {
    type Tx<'t> = SqliteTransaction<'t>;

    fn find_project(&self, name: &str) -> Result<Option<Project>> {
        Ok(self
            .conn
            .query_row("SELECT id, name FROM project WHERE name = ?1", [name], project_from_row)
            .optional()?)
    }

    fn get_or_create_project(&mut self, name: &str) -> Result<Project> {
        // 依赖 name 的唯一约束：并发插入同名项目时只有一行生效
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO project (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
            [name],
        )?;
        let project = tx.query_row(
            "SELECT id, name FROM project WHERE name = ?1",
            [name],
            project_from_row,
        )?;
        tx.commit()?;
        Ok(project)
    }

    fn create_import_job(&mut self, job: &NewImportJob<'_>) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO import_job (project_id, filename, imported_at, entries_total, file_lines_count, lines_processed, is_processed)
             VALUES (?1, ?2, ?3, 0, ?4, 0, 0)",
            params![
                job.project_id,
                job.filename,
                Utc::now(),
                count_to_sql(job.file_lines_count)
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn begin(&mut self) -> Result<SqliteTransaction<'_>> {
        Ok(SqliteTransaction { tx: self.conn.transaction()? })
    }
}

/// SQLite 事务，未提交即丢弃时自动回滚
pub struct SqliteTransaction<'c> {
    tx: rusqlite::Transaction<'c>,
}

impl StoreTransaction for SqliteTransaction<'_> {
    fn insert_entries(
        &mut self,
        import_job_id: i64,
        records: &[ParsedRecord],
    ) -> Result<usize> {
        let mut inserted = 0;

        for chunk in records.chunks(MAX_ROWS_PER_STATEMENT) {
            let datetimes: Vec<DateTime<Utc>> =
                chunk.iter().map(ParsedRecord::datetime_utc).collect();

            let placeholders = vec!["(?, ?, ?, ?, ?, ?, ?, ?, ?)"; chunk.len()].join(", ");
            let sql = format!(
                "INSERT INTO log_entry (import_job_id, ip, datetime, method, path, query, status, referer, user_agent) VALUES {placeholders}"
            );

            let mut values: Vec<&dyn ToSql> = Vec::with_capacity(chunk.len() * 9);
            for (record, datetime) in chunk.iter().zip(&datetimes) {
                let row: [&dyn ToSql; 9] = [
                    &import_job_id,
                    &record.ip,
                    datetime,
                    &record.method,
                    &record.path,
                    &record.query,
                    &record.status,
                    &record.referer,
                    &record.user_agent,
                ];
                values.extend_from_slice(&row);
            }

            inserted += self.tx.prepare_cached(&sql)?.execute(values.as_slice())?;
        }

        #[cfg(feature = "logging")]
        tracing::trace!("SQLite批次插入 {} 条记录 (任务 {})", inserted, import_job_id);

        Ok(inserted)
    }

    fn update_job_stats(&mut self, import_job_id: i64, stats: &JobStats) -> Result<()> {
        let updated = self.tx.execute(
            "UPDATE import_job SET entries_total = ?1, lines_processed = ?2, from_time = ?3, to_time = ?4 WHERE id = ?5",
            params![
                count_to_sql(stats.entries_total),
                count_to_sql(stats.lines_processed),
                stats.from_time,
                stats.to_time,
                import_job_id
            ],
        )?;
        if updated == 0 {
            return Err(ImportError::store(format!("导入任务不存在: {import_job_id}")));
        }
        Ok(())
    }

    fn mark_processed(&mut self, import_job_id: i64) -> Result<()> {
        let updated = self.tx.execute(
            "UPDATE import_job SET is_processed = 1 WHERE id = ?1",
            [import_job_id],
        )?;
        if updated == 0 {
            return Err(ImportError::store(format!("导入任务不存在: {import_job_id}")));
        }
        Ok(())
    }

    fn commit(self) -> Result<()> {
        self.tx.commit()?;
        Ok(())
    }
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project { id: row.get(0)?, name: row.get(1)? })
}

fn import_job_from_row(row: &Row<'_>) -> rusqlite::Result<ImportJob> {
    Ok(ImportJob {
        id: row.get(0)?,
        project_id: row.get(1)?,
        filename: row.get(2)?,
        imported_at: row.get(3)?,
        from_time: row.get(4)?,
        to_time: row.get(5)?,
        entries_total: row.get(6)?,
        file_lines_count: row.get(7)?,
        lines_processed: row.get(8)?,
        is_processed: row.get(9)?,
    })
}

fn log_entry_from_row(row: &Row<'_>) -> rusqlite::Result<LogEntry> {
    Ok(LogEntry {
        id: row.get(0)?,
        import_job_id: row.get(1)?,
        ip: row.get(2)?,
        datetime: row.get(3)?,
        method: row.get(4)?,
        path: row.get(5)?,
        query: row.get(6)?,
        status: row.get(7)?,
        referer: row.get(8)?,
        user_agent: row.get(9)?,
    })
}
