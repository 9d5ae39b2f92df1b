use crate::calculations::Analysis;
use crate::calculations::critical_path::CriticalEdge;
use crate::graph::{AccessKind, DependencyGraph};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    pub task_id: String,
    pub host: Option<String>,
    pub command: Option<String>,
    pub duration: f64,
    pub cpu_time: f64,
    pub metadata_time: f64,
    pub blocking_time: f64,
    pub io_operations: u64,
    pub eft: Option<f64>,
    pub critical: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub path: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeReport {
    pub task_id: String,
    pub path: String,
    pub kind: AccessKind,
    pub reread: bool,
    pub critical: bool,
}

/// Node/edge enumeration of an analysed graph, in first-reference order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub tasks: Vec<TaskReport>,
    pub files: Vec<FileReport>,
    pub edges: Vec<EdgeReport>,
    pub critical_path: Vec<String>,
    pub makespan: f64,
}

impl AnalysisReport {
    pub fn new(graph: &DependencyGraph, analysis: &Analysis) -> Self {
        let path = &analysis.critical_path;
        let tasks = graph
            .tasks()
            .map(|task| TaskReport {
                task_id: task.id.clone(),
                host: task.host.clone(),
                command: task.command.clone(),
                duration: task.duration,
                cpu_time: task.cpu_time(),
                metadata_time: task.metadata_time_secs(),
                blocking_time: task.blocking_time_secs(),
                io_operations: task.io_operations,
                eft: analysis.eft(&task.id),
                critical: path.contains_task(&task.id),
            })
            .collect();
        let files = graph
            .files()
            .map(|file| FileReport {
                path: file.path.clone(),
                size: file.size,
            })
            .collect();
        let edges = graph
            .edges()
            .map(|edge| {
                let critical_edge = match edge.kind {
                    AccessKind::Produces => CriticalEdge::Produces {
                        task: edge.task.to_string(),
                        file: edge.file.to_string(),
                    },
                    AccessKind::Consumes => CriticalEdge::Consumes {
                        file: edge.file.to_string(),
                        task: edge.task.to_string(),
                    },
                };
                EdgeReport {
                    task_id: edge.task.to_string(),
                    path: edge.file.to_string(),
                    kind: edge.kind,
                    reread: edge.reread,
                    critical: path.is_critical(&critical_edge),
                }
            })
            .collect();

        Self {
            tasks,
            files,
            edges,
            critical_path: path.tasks.clone(),
            makespan: path.makespan,
        }
    }

    pub fn tasks_frame(&self) -> PolarsResult<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(10);

        let ids: Vec<&str> = self.tasks.iter().map(|t| t.task_id.as_str()).collect();
        columns.push(Series::new(PlSmallStr::from_static("task_id"), ids).into_column());

        let hosts: Vec<Option<&str>> = self.tasks.iter().map(|t| t.host.as_deref()).collect();
        columns.push(Series::new(PlSmallStr::from_static("host"), hosts).into_column());

        let durations: Vec<f64> = self.tasks.iter().map(|t| t.duration).collect();
        columns.push(Series::new(PlSmallStr::from_static("duration"), durations).into_column());

        let cpu: Vec<f64> = self.tasks.iter().map(|t| t.cpu_time).collect();
        columns.push(Series::new(PlSmallStr::from_static("cpu_time"), cpu).into_column());

        let meta: Vec<f64> = self.tasks.iter().map(|t| t.metadata_time).collect();
        columns.push(Series::new(PlSmallStr::from_static("metadata_time"), meta).into_column());

        let blocking: Vec<f64> = self.tasks.iter().map(|t| t.blocking_time).collect();
        columns.push(Series::new(PlSmallStr::from_static("blocking_time"), blocking).into_column());

        let io: Vec<u64> = self.tasks.iter().map(|t| t.io_operations).collect();
        columns.push(Series::new(PlSmallStr::from_static("io_operations"), io).into_column());

        let eft: Vec<Option<f64>> = self.tasks.iter().map(|t| t.eft).collect();
        columns.push(Series::new(PlSmallStr::from_static("eft"), eft).into_column());

        let critical: Vec<bool> = self.tasks.iter().map(|t| t.critical).collect();
        columns.push(Series::new(PlSmallStr::from_static("critical"), critical).into_column());

        DataFrame::new(columns)
    }

    pub fn files_frame(&self) -> PolarsResult<DataFrame> {
        let paths: Vec<&str> = self.files.iter().map(|f| f.path.as_str()).collect();
        let sizes: Vec<u64> = self.files.iter().map(|f| f.size).collect();
        DataFrame::new(vec![
            Series::new(PlSmallStr::from_static("path"), paths).into_column(),
            Series::new(PlSmallStr::from_static("size"), sizes).into_column(),
        ])
    }
}
