//! 导入流程编排
//!
//! ## 单个文件的状态流转
//!
//! ```text
//! Discovered → Opened → Streaming ─→ Finalizing → Completed
//!                           │              │
//!                           ├──────────────┴─→ Aborted   (存储或读取失败)
//!                           └─→ Cancelled                (收到取消信号)
//! ```
//!
//! [`ImportRun`] 是一个迭代器：每次调用 `next()` 推进流水线直到产生下一个事件，
//! 调用方停止迭代即停止导入。已提交的批次保留，未完成的任务 `is_processed` 保持为 0。
//!
//! 多个文件按发现顺序依次处理；单个文件失败只中止该文件，随后继续处理下一个文件。

use crate::accesslog::LineParser;
use crate::config::{DEFAULT_BATCH_SIZE, DEFAULT_PROGRESS_INTERVAL, ImportConfig};
use crate::discover::{Discovery, discover};
use crate::error::{ImportError, Result};
use crate::importer::batch::BatchIngestor;
use crate::importer::events::ImportEvent;
use crate::importer::progress::{ProgressEstimator, count_lines};
use crate::importer::report::ImportReport;
use crate::importer::stats::JobStats;
use crate::store::{LogStore, NewImportJob};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 导入参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// 每个事务提交的记录数
    pub batch_size: usize,
    /// 每处理多少行上报一次进度
    pub progress_interval: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl From<&ImportConfig> for ImportOptions {
    fn from(config: &ImportConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            progress_interval: config.progress_interval,
        }
    }
}

/// 打开日志文件的读取流
pub type OpenFn = fn(&Path) -> io::Result<Box<dyn BufRead>>;

/// 默认打开方式：带缓冲的普通文件
pub fn open_file(path: &Path) -> io::Result<Box<dyn BufRead>> {
    Ok(Box::new(BufReader::new(File::open(path)?)))
}

/// 校验一次导入调用的参数，不触碰任何文件
///
/// # Errors
/// 项目名为空、参数为 0 或匹配模式语法错误时返回配置错误。
pub fn validate_invocation(
    path_pattern: &str,
    project_name: &str,
    options: &ImportOptions,
) -> Result<()> {
    if project_name.trim().is_empty() {
        return Err(ImportError::config("项目名不能为空"));
    }
    if options.batch_size == 0 {
        return Err(ImportError::config("batch_size 不能为0"));
    }
    if options.progress_interval == 0 {
        return Err(ImportError::config("progress_interval 不能为0"));
    }
    glob::Pattern::new(path_pattern)?;
    Ok(())
}

/// 导入入口
pub struct Importer<'s, S: LogStore> {
    store: &'s mut S,
    options: ImportOptions,
    cancel: Option<Arc<AtomicBool>>,
    open: OpenFn,
}

impl<'s, S: LogStore> Importer<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self {
            store,
            options: ImportOptions::default(),
            cancel: None,
            open: open_file,
        }
    }

    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    /// 设置取消标志，每读取一行前检查一次
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// 替换日志文件的打开方式（压缩文件、测试用读取器等）
    pub fn with_opener(mut self, open: OpenFn) -> Self {
        self.open = open;
        self
    }

    /// 开始一次导入运行
    ///
    /// # Errors
    /// 项目名为空、参数为 0 或匹配模式语法错误时返回配置错误，此时没有读取任何文件。
    pub fn import(
        self,
        path_pattern: &str,
        project_name: &str,
        dry_run: bool,
    ) -> Result<ImportRun<'s, S>> {
        validate_invocation(path_pattern, project_name, &self.options)?;
        let project_name = project_name.trim();

        let discovery = discover(path_pattern)?;

        #[cfg(feature = "logging")]
        tracing::info!(
            "开始导入: 模式 {}, 项目 {}, 演练模式 {}",
            path_pattern,
            project_name,
            dry_run
        );

        Ok(ImportRun {
            store: self.store,
            options: self.options,
            cancel: self.cancel,
            open: self.open,
            pattern: path_pattern.to_string(),
            project_name: project_name.to_string(),
            dry_run,
            project_id: None,
            discovery: Some(discovery),
            files: Vec::new().into_iter(),
            pending: VecDeque::new(),
            stage: Stage::Start,
            parser: LineParser::new(),
        })
    }
}

enum Stage {
    Start,
    NextFile,
    Streaming(Box<FileImport>),
    Done,
}

/// 正在处理的文件
struct FileImport {
    path: PathBuf,
    reader: Box<dyn BufRead>,
    line: Vec<u8>,
    ingestor: BatchIngestor,
    progress: ProgressEstimator,
}

/// 一次导入运行，按顺序产生 [`ImportEvent`]
pub struct ImportRun<'s, S: LogStore> {
    store: &'s mut S,
    options: ImportOptions,
    cancel: Option<Arc<AtomicBool>>,
    open: OpenFn,
    pattern: String,
    project_name: String,
    dry_run: bool,
    project_id: Option<i64>,
    discovery: Option<Discovery>,
    files: std::vec::IntoIter<PathBuf>,
    pending: VecDeque<ImportEvent>,
    stage: Stage,
    parser: LineParser,
}

impl<S: LogStore> ImportRun<'_, S> {
    /// 运行到结束并汇总所有事件
    pub fn finish(self) -> ImportReport {
        let mut report = ImportReport::new();
        for event in self {
            report.record(&event);
        }
        report.finish();
        report
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    fn emit(&mut self, event: ImportEvent) {
        self.pending.push_back(event);
    }

    fn start(&mut self) -> Stage {
        let discovery = self.discovery.take().unwrap_or_default();

        for skipped in discovery.skipped {
            self.emit(ImportEvent::SkippedFile {
                path: skipped.path,
                reason: skipped.reason,
            });
        }

        if discovery.files.is_empty() {
            #[cfg(feature = "logging")]
            tracing::info!("没有找到匹配的文件: {}", self.pattern);
            self.emit(ImportEvent::NoFiles { pattern: self.pattern.clone() });
            return Stage::Done;
        }

        // 演练模式不写任何数据，只查找项目
        let project = if self.dry_run {
            self.store.find_project(&self.project_name)
        } else {
            self.store.get_or_create_project(&self.project_name).map(Some)
        };

        match project {
            Ok(project) => {
                self.project_id = project.as_ref().map(|p| p.id);
                self.emit(ImportEvent::Project {
                    id: self.project_id,
                    name: self.project_name.clone(),
                });
            }
            Err(error) => {
                #[cfg(feature = "logging")]
                tracing::error!("无法解析项目 {}: {}", self.project_name, error);
                self.emit(ImportEvent::RunFailed { error });
                return Stage::Done;
            }
        }

        self.files = discovery.files.into_iter();
        Stage::NextFile
    }

    fn open_next_file(&mut self) -> Stage {
        let Some(path) = self.files.next() else {
            #[cfg(feature = "logging")]
            tracing::info!("导入运行结束: {}", self.pattern);
            return Stage::Done;
        };

        if self.is_cancelled() {
            self.emit(ImportEvent::Cancelled {
                path: None,
                import_job_id: None,
                stats: JobStats::new(),
            });
            return Stage::Done;
        }

        // 预扫描行数用于进度估算，发现时可读的文件此时也可能已被删除
        let opened = count_lines(&path)
            .and_then(|total| (self.open)(&path).map(|reader| (total, reader)));
        let (total_lines, reader) = match opened {
            Ok(opened) => opened,
            Err(e) => {
                #[cfg(feature = "logging")]
                tracing::warn!("无法读取文件 {}: {}", path.display(), e);
                self.emit(ImportEvent::SkippedFile { path, reason: e.to_string() });
                return Stage::NextFile;
            }
        };

        let ingestor = if self.dry_run {
            BatchIngestor::dry_run(self.options.batch_size)
        } else {
            match self.create_job(&path, total_lines) {
                Ok(import_job_id) => BatchIngestor::new(import_job_id, self.options.batch_size),
                Err(error) => {
                    self.abort(path, None, JobStats::new(), error);
                    return Stage::NextFile;
                }
            }
        };

        #[cfg(feature = "logging")]
        tracing::info!(
            "开始处理文件: {} ({} 行, 任务 {:?})",
            path.display(),
            total_lines,
            ingestor.import_job_id()
        );

        self.emit(ImportEvent::FileStarted {
            path: path.clone(),
            import_job_id: ingestor.import_job_id(),
            total_lines,
        });

        Stage::Streaming(Box::new(FileImport {
            progress: ProgressEstimator::new(&path, total_lines, self.options.progress_interval),
            path,
            reader,
            line: Vec::new(),
            ingestor,
        }))
    }

    fn create_job(&mut self, path: &std::path::Path, total_lines: u64) -> Result<i64> {
        let project_id = self
            .project_id
            .ok_or_else(|| ImportError::other("项目尚未创建"))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.store.create_import_job(&NewImportJob {
            project_id,
            filename: &filename,
            file_lines_count: total_lines,
        })
    }

    /// 处理一行；读到文件末尾时进入收尾
    fn step(&mut self, mut file: Box<FileImport>) -> Stage {
        if self.is_cancelled() {
            #[cfg(feature = "logging")]
            tracing::warn!(
                "收到取消信号，停止处理 {} (已提交 {} 条)",
                file.path.display(),
                file.ingestor.stats().entries_total
            );
            self.emit(ImportEvent::Cancelled {
                import_job_id: file.ingestor.import_job_id(),
                stats: file.ingestor.stats().clone(),
                path: Some(file.path),
            });
            return Stage::Done;
        }

        file.line.clear();
        match file.reader.read_until(b'\n', &mut file.line) {
            Ok(0) => self.finish_file(file),
            Ok(_) => {
                let progress = file.progress.record_line();
                let lines_processed = file.progress.processed();

                let parsed = {
                    let text = String::from_utf8_lossy(&file.line);
                    self.parser.parse(&text)
                };
                if let Some(record) = parsed {
                    match file.ingestor.push(&mut *self.store, record, lines_processed) {
                        Ok(Some(records)) => self.emit_flush(&file, records),
                        Ok(None) => {}
                        Err(error) => {
                            self.abort_file(file, error);
                            return Stage::NextFile;
                        }
                    }
                }

                if let Some(progress) = progress {
                    self.emit(ImportEvent::Progress(progress));
                }
                Stage::Streaming(file)
            }
            Err(e) => {
                self.abort_file(file, e.into());
                Stage::NextFile
            }
        }
    }

    fn finish_file(&mut self, mut file: Box<FileImport>) -> Stage {
        if let Some(progress) = file.progress.finish() {
            self.emit(ImportEvent::Progress(progress));
        }
        let lines_processed = file.progress.processed();

        match file.ingestor.flush(&mut *self.store, lines_processed) {
            Ok(0) => {}
            Ok(records) => self.emit_flush(&file, records),
            Err(error) => {
                self.abort_file(file, error);
                return Stage::NextFile;
            }
        }

        match file.ingestor.finalize(&mut *self.store, lines_processed) {
            Ok(stats) => {
                #[cfg(feature = "logging")]
                tracing::info!("文件导入完成: {} - {}", file.path.display(), stats);
                self.emit(ImportEvent::FileCompleted {
                    import_job_id: file.ingestor.import_job_id(),
                    flushes: file.ingestor.flush_count(),
                    path: file.path,
                    stats,
                });
            }
            Err(error) => self.abort_file(file, error),
        }
        Stage::NextFile
    }

    fn emit_flush(&mut self, file: &FileImport, records: usize) {
        if let Some(import_job_id) = file.ingestor.import_job_id() {
            self.emit(ImportEvent::BatchFlushed {
                path: file.path.clone(),
                import_job_id,
                records,
                entries_total: file.ingestor.stats().entries_total,
            });
        }
    }

    fn abort_file(&mut self, file: Box<FileImport>, error: ImportError) {
        let import_job_id = file.ingestor.import_job_id();
        let stats = file.ingestor.stats().clone();
        self.abort(file.path, import_job_id, stats, error);
    }

    fn abort(
        &mut self,
        path: PathBuf,
        import_job_id: Option<i64>,
        stats: JobStats,
        error: ImportError,
    ) {
        #[cfg(feature = "logging")]
        tracing::error!(
            "文件导入中止: {} (任务 {:?}, 已提交 {} 条): {}",
            path.display(),
            import_job_id,
            stats.entries_total,
            error
        );
        self.emit(ImportEvent::FileAborted { path, import_job_id, stats, error });
    }
}

impl<S: LogStore> Iterator for ImportRun<'_, S> {
    type Item = ImportEvent;

    fn next(&mut self) -> Option<ImportEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            self.stage = match std::mem::replace(&mut self.stage, Stage::Done) {
                Stage::Start => self.start(),
                Stage::NextFile => self.open_next_file(),
                Stage::Streaming(file) => self.step(file),
                Stage::Done => return None,
            };
        }
    }
}
