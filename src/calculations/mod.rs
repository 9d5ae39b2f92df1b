pub mod critical_path;
pub mod forward_pass;

use crate::graph::DependencyGraph;
use critical_path::{CriticalPath, CriticalPathTrace};
use forward_pass::ForwardPass;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// Each listed task depends on the next one; the last depends on the first.
    #[error("dependency cycle through tasks {}", .tasks.join(" -> "))]
    Cycle { tasks: Vec<String> },
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Outcome of the critical-path analysis over a finished graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Analysis {
    pub eft: BTreeMap<String, f64>,
    pub critical_path: CriticalPath,
}

impl Analysis {
    pub fn eft(&self, task_id: &str) -> Option<f64> {
        self.eft.get(task_id).copied()
    }

    pub fn makespan(&self) -> f64 {
        self.critical_path.makespan
    }
}

/// Runs the EFT pass and the critical-path back-trace.
pub fn analyze(graph: &DependencyGraph) -> AnalysisResult<Analysis> {
    let by_index = ForwardPass::new(graph).execute_indexed()?;
    let critical_path = CriticalPathTrace::new(graph, &by_index).execute();
    let eft = by_index
        .into_iter()
        .filter_map(|(ix, eft)| graph.task_at(ix).map(|task| (task.id.clone(), eft)))
        .collect();
    Ok(Analysis { eft, critical_path })
}
