use super::{AnalysisError, AnalysisResult};
use crate::graph::DependencyGraph;
use petgraph::graph::NodeIndex;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

enum Visit {
    InProgress,
    Done(f64),
}

struct Frame {
    task: NodeIndex,
    parents: Vec<NodeIndex>,
    next: usize,
}

impl Frame {
    fn new(graph: &DependencyGraph, task: NodeIndex) -> Self {
        Self {
            task,
            parents: graph.parent_indices(task),
            next: 0,
        }
    }
}

/// Earliest-finish-time pass.
///
/// `EFT(t) = duration(t) + max(EFT(p) for p in parents(t))`, with an empty
/// maximum of zero. Every task is visited once; a task met again while still
/// on the depth-first stack closes a cycle and aborts the pass.
pub struct ForwardPass<'a> {
    graph: &'a DependencyGraph,
}

impl<'a> ForwardPass<'a> {
    pub fn new(graph: &'a DependencyGraph) -> Self {
        Self { graph }
    }

    /// EFT per task id, ordered by id.
    pub fn execute(&self) -> AnalysisResult<BTreeMap<String, f64>> {
        let by_index = self.execute_indexed()?;
        Ok(by_index
            .into_iter()
            .filter_map(|(ix, eft)| self.graph.task_at(ix).map(|task| (task.id.clone(), eft)))
            .collect())
    }

    /// EFT per task node index.
    pub fn execute_indexed(&self) -> AnalysisResult<HashMap<NodeIndex, f64>> {
        let mut state: HashMap<NodeIndex, Visit> = HashMap::with_capacity(self.graph.task_count());

        for root in self.graph.task_indices() {
            if state.contains_key(&root) {
                continue;
            }
            state.insert(root, Visit::InProgress);
            let mut stack = vec![Frame::new(self.graph, root)];

            while let Some(frame) = stack.last_mut() {
                if let Some(&parent) = frame.parents.get(frame.next) {
                    frame.next += 1;
                    match state.get(&parent) {
                        Some(Visit::Done(_)) => {}
                        Some(Visit::InProgress) => return Err(self.cycle_error(&stack, parent)),
                        None => {
                            state.insert(parent, Visit::InProgress);
                            stack.push(Frame::new(self.graph, parent));
                        }
                    }
                    continue;
                }

                let latest_parent = frame
                    .parents
                    .iter()
                    .filter_map(|p| match state.get(p) {
                        Some(Visit::Done(eft)) => Some(*eft),
                        _ => None,
                    })
                    .fold(0.0, f64::max);
                let task = frame.task;
                let eft = self.duration(task) + latest_parent;
                stack.pop();
                state.insert(task, Visit::Done(eft));
            }
        }

        let results: HashMap<NodeIndex, f64> = state
            .into_iter()
            .filter_map(|(ix, visit)| match visit {
                Visit::Done(eft) => Some((ix, eft)),
                Visit::InProgress => None,
            })
            .collect();

        let makespan = results.values().copied().fold(0.0, f64::max);
        info!(tasks = results.len(), makespan, "earliest finish times computed");
        Ok(results)
    }

    fn duration(&self, task: NodeIndex) -> f64 {
        self.graph.task_at(task).map_or(0.0, |node| node.duration)
    }

    /// Tasks from the first visit of `repeated` to the top of the stack; each
    /// one waits on the next, and the last waits on the first.
    fn cycle_error(&self, stack: &[Frame], repeated: NodeIndex) -> AnalysisError {
        let start = stack
            .iter()
            .position(|frame| frame.task == repeated)
            .unwrap_or(0);
        let tasks: Vec<String> = stack[start..]
            .iter()
            .filter_map(|frame| self.graph.task_at(frame.task).map(|task| task.id.clone()))
            .collect();
        debug!(?tasks, "cycle detected during earliest finish time pass");
        AnalysisError::Cycle { tasks }
    }
}
