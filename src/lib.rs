pub mod calculations;
pub mod classifier;
pub mod config;
pub mod event;
pub mod graph;
pub mod persistence;
pub mod report;
pub mod task;
pub(crate) mod task_validation;

pub use calculations::critical_path::{CriticalEdge, CriticalPath};
pub use calculations::{Analysis, AnalysisError, AnalysisResult, analyze};
pub use classifier::{ClassifyError, IoCounters, Mutation, classify};
pub use config::AnalysisConfig;
pub use event::{OperationEvent, OperationKind};
pub use graph::builder::{BuildStats, GraphBuilder, build_graph};
pub use graph::{AccessKind, DependencyGraph, EdgeView, FileNode};
pub use persistence::{
    EventStream, PersistenceError, load_config_from_json, load_events_from_jsonl,
    load_report_from_json, load_task_metadata_from_csv, read_events_jsonl, read_task_metadata_csv,
    save_report_to_json, save_task_report_to_csv,
};
pub use report::AnalysisReport;
pub use task::{TaskMetadata, TaskNode};
pub use task_validation::TaskValidationError;
