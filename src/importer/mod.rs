//! 访问日志导入流水线
//!
//! 文件发现 → 逐行解析 → 批量事务入库 → 任务统计与进度估算

pub mod batch;
pub mod events;
pub mod orchestrator;
pub mod progress;
pub mod report;
pub mod session;
pub mod stats;

pub use batch::BatchIngestor;
pub use events::ImportEvent;
pub use orchestrator::{
    ImportOptions, ImportRun, Importer, OpenFn, open_file, validate_invocation,
};
pub use progress::{Progress, ProgressEstimator, count_lines, estimate_eta};
pub use report::ImportReport;
pub use session::import_to_database;
pub use stats::JobStats;
