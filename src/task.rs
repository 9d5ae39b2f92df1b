use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Per-task facts supplied by the trace-metadata collaborator
/// (one row of the run's state table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMetadata {
    pub task_id: String,
    /// Turnaround (wall) time in seconds.
    pub duration: f64,
    #[serde(default)]
    pub cpu_user: f64,
    #[serde(default)]
    pub cpu_system: f64,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub command: Option<String>,
}

impl TaskMetadata {
    pub fn new(task_id: impl Into<String>, duration: f64) -> Self {
        Self {
            task_id: task_id.into(),
            duration,
            cpu_user: 0.0,
            cpu_system: 0.0,
            host: None,
            started_at: None,
            command: None,
        }
    }
}

/// A traced execution unit in the dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskNode {
    pub id: String,
    /// Sum of elapsed time of non-I/O calls, in nanoseconds.
    pub metadata_time_ns: u64,
    /// Blocking read + write time, in nanoseconds.
    pub blocking_time_ns: u64,
    pub io_operations: u64,
    pub duration: f64,
    pub cpu_user: f64,
    pub cpu_system: f64,
    pub host: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub command: Option<String>,
    /// False until metadata for this task has been registered.
    pub has_metadata: bool,
}

impl TaskNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata_time_ns: 0,
            blocking_time_ns: 0,
            io_operations: 0,
            duration: 0.0,
            cpu_user: 0.0,
            cpu_system: 0.0,
            host: None,
            started_at: None,
            command: None,
            has_metadata: false,
        }
    }

    pub fn apply_metadata(&mut self, metadata: &TaskMetadata) {
        self.duration = metadata.duration;
        self.cpu_user = metadata.cpu_user;
        self.cpu_system = metadata.cpu_system;
        self.host = metadata.host.clone();
        self.started_at = metadata.started_at;
        self.command = metadata.command.clone();
        self.has_metadata = true;
    }

    pub fn cpu_time(&self) -> f64 {
        (self.cpu_user + self.cpu_system).max(0.0)
    }

    pub fn metadata_time_secs(&self) -> f64 {
        self.metadata_time_ns as f64 / NANOS_PER_SEC
    }

    pub fn blocking_time_secs(&self) -> f64 {
        self.blocking_time_ns as f64 / NANOS_PER_SEC
    }
}
