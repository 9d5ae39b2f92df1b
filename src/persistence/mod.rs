use crate::task_validation::TaskValidationError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid task metadata: {0}")]
    Validation(#[from] TaskValidationError),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

pub mod file;

pub use file::{
    EventStream, load_config_from_json, load_events_from_jsonl, load_report_from_json,
    load_task_metadata_from_csv, read_events_jsonl, read_task_metadata_csv, save_report_to_json,
    save_task_report_to_csv,
};
