use super::{PersistenceError, PersistenceResult};
use crate::config::AnalysisConfig;
use crate::event::OperationEvent;
use crate::report::AnalysisReport;
use crate::task::TaskMetadata;
use crate::task_validation::validate_task_metadata_collection;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

/// Events decoded from a JSONL stream, with the 1-based numbers of the lines
/// that could not be decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventStream {
    pub events: Vec<OperationEvent>,
    pub skipped_lines: Vec<usize>,
}

/// Reads one JSON event per line. Blank lines are ignored; undecodable lines
/// are logged and skipped so the rest of the stream still loads.
pub fn read_events_jsonl<R: BufRead>(reader: R) -> PersistenceResult<EventStream> {
    let mut stream = EventStream::default();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<OperationEvent>(trimmed) {
            Ok(event) => stream.events.push(event),
            Err(err) => {
                warn!(line = idx + 1, error = %err, "skipping undecodable event line");
                stream.skipped_lines.push(idx + 1);
            }
        }
    }
    Ok(stream)
}

pub fn load_events_from_jsonl<P: AsRef<Path>>(path: P) -> PersistenceResult<EventStream> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let stream = read_events_jsonl(BufReader::new(file))?;
    info!(
        path = %path.display(),
        events = stream.events.len(),
        skipped = stream.skipped_lines.len(),
        "loaded operation events"
    );
    Ok(stream)
}

#[derive(Serialize, Deserialize)]
struct TaskMetadataCsvRecord {
    task_id: String,
    duration: String,
    #[serde(default)]
    cpu_user: String,
    #[serde(default)]
    cpu_system: String,
    #[serde(default)]
    host: String,
    #[serde(default)]
    started_at: String,
    #[serde(default)]
    command: String,
}

impl TaskMetadataCsvRecord {
    fn into_metadata(self) -> PersistenceResult<TaskMetadata> {
        let duration = parse_f64(&self.duration)?.ok_or_else(|| {
            PersistenceError::InvalidData(format!("task {} has no duration", self.task_id))
        })?;
        let mut metadata = TaskMetadata::new(self.task_id.trim(), duration);
        metadata.cpu_user = parse_f64(&self.cpu_user)?.unwrap_or(0.0);
        metadata.cpu_system = parse_f64(&self.cpu_system)?.unwrap_or(0.0);
        metadata.host = parse_string_option(self.host);
        metadata.started_at = parse_timestamp(&self.started_at)?;
        metadata.command = parse_string_option(self.command);
        Ok(metadata)
    }
}

/// Reads the per-task state table: `task_id,duration,cpu_user,cpu_system,host,started_at,command`.
pub fn read_task_metadata_csv<R: Read>(reader: R) -> PersistenceResult<Vec<TaskMetadata>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);
    let mut tasks = Vec::new();
    for record in reader.deserialize::<TaskMetadataCsvRecord>() {
        let record = record?;
        tasks.push(record.into_metadata()?);
    }
    validate_task_metadata_collection(&tasks)?;
    Ok(tasks)
}

pub fn load_task_metadata_from_csv<P: AsRef<Path>>(
    path: P,
) -> PersistenceResult<Vec<TaskMetadata>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let tasks = read_task_metadata_csv(file)?;
    info!(path = %path.display(), tasks = tasks.len(), "loaded task metadata");
    Ok(tasks)
}

pub fn load_config_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<AnalysisConfig> {
    let file = File::open(path)?;
    let config: AnalysisConfig = serde_json::from_reader(BufReader::new(file))?;
    if !config.default_duration.is_finite() || config.default_duration < 0.0 {
        return Err(PersistenceError::InvalidData(format!(
            "default_duration must be a non-negative number (got {})",
            config.default_duration
        )));
    }
    Ok(config)
}

pub fn save_report_to_json<P: AsRef<Path>>(
    report: &AnalysisReport,
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}

pub fn load_report_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<AnalysisReport> {
    let file = File::open(path)?;
    let report = serde_json::from_reader(BufReader::new(file))?;
    Ok(report)
}

/// Writes one row per task, the cost table of the run.
pub fn save_task_report_to_csv<P: AsRef<Path>>(
    report: &AnalysisReport,
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for task in &report.tasks {
        writer.serialize(task)?;
    }
    writer.flush()?;
    Ok(())
}

fn parse_f64(input: &str) -> PersistenceResult<Option<f64>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid float '{input}': {e}")))
}

fn parse_timestamp(input: &str) -> PersistenceResult<Option<DateTime<Utc>>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S")
        .map(|naive| Some(naive.and_utc()))
        .map_err(|e| PersistenceError::InvalidData(format!("invalid timestamp '{input}': {e}")))
}

fn parse_string_option(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.trim().to_string())
    }
}
