use crate::graph::DependencyGraph;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// One edge on the critical path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CriticalEdge {
    Produces { task: String, file: String },
    Consumes { file: String, task: String },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CriticalPath {
    /// Tasks from the source of the chain to the task with the largest EFT.
    pub tasks: Vec<String>,
    pub edges: BTreeSet<CriticalEdge>,
    /// EFT of the final task, equal to the largest EFT in the graph.
    pub makespan: f64,
}

impl CriticalPath {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains_task(&self, task_id: &str) -> bool {
        self.tasks.iter().any(|t| t == task_id)
    }

    pub fn is_critical(&self, edge: &CriticalEdge) -> bool {
        self.edges.contains(edge)
    }

    /// Files that carry the critical dependency from `producer` to `consumer`.
    pub fn files_between(&self, producer: &str, consumer: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter_map(|edge| match edge {
                CriticalEdge::Produces { task, file } if task == producer => Some(file.as_str()),
                _ => None,
            })
            .filter(|file| {
                self.edges.contains(&CriticalEdge::Consumes {
                    file: (*file).to_string(),
                    task: consumer.to_string(),
                })
            })
            .collect()
    }

    /// Human readable chain, e.g. `A -> x.o -> B`.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for (i, task) in self.tasks.iter().enumerate() {
            if i > 0 {
                let files = self.files_between(&self.tasks[i - 1], task);
                match files.as_slice() {
                    [] => {}
                    [file] => {
                        out.push_str(" -> ");
                        out.push_str(file);
                    }
                    many => {
                        out.push_str(" -> [");
                        out.push_str(&many.join(", "));
                        out.push(']');
                    }
                }
                out.push_str(" -> ");
            }
            out.push_str(task);
        }
        out
    }
}

/// Back-traces the critical path from the task with the largest EFT.
///
/// Ties between equal EFTs always go to the smallest task id, both for the
/// starting task and for each parent step.
pub struct CriticalPathTrace<'a> {
    graph: &'a DependencyGraph,
    eft: &'a HashMap<NodeIndex, f64>,
}

impl<'a> CriticalPathTrace<'a> {
    pub fn new(graph: &'a DependencyGraph, eft: &'a HashMap<NodeIndex, f64>) -> Self {
        Self { graph, eft }
    }

    pub fn execute(&self) -> CriticalPath {
        let Some(mut tail) = self.latest(self.graph.task_indices()) else {
            return CriticalPath::default();
        };
        let makespan = self.eft_of(tail);
        let mut chain = vec![tail];
        let mut visited = HashSet::from([tail]);
        let mut edges = BTreeSet::new();

        loop {
            let Some(best) = self.latest(self.graph.parent_indices(tail).into_iter()) else {
                break;
            };
            for file_ix in self.graph.shared_file_indices(best, tail) {
                let (Some(file), Some(producer), Some(consumer)) = (
                    self.graph.file_at(file_ix),
                    self.graph.task_at(best),
                    self.graph.task_at(tail),
                ) else {
                    continue;
                };
                edges.insert(CriticalEdge::Produces {
                    task: producer.id.clone(),
                    file: file.path.clone(),
                });
                edges.insert(CriticalEdge::Consumes {
                    file: file.path.clone(),
                    task: consumer.id.clone(),
                });
            }
            if !visited.insert(best) {
                break;
            }
            chain.push(best);
            tail = best;
        }

        chain.reverse();
        let tasks: Vec<String> = chain
            .into_iter()
            .filter_map(|ix| self.graph.task_at(ix).map(|task| task.id.clone()))
            .collect();
        debug!(length = tasks.len(), makespan, "critical path traced");

        CriticalPath {
            tasks,
            edges,
            makespan,
        }
    }

    fn eft_of(&self, task: NodeIndex) -> f64 {
        self.eft.get(&task).copied().unwrap_or(0.0)
    }

    fn latest(&self, candidates: impl Iterator<Item = NodeIndex>) -> Option<NodeIndex> {
        candidates
            .filter_map(|ix| {
                let task = self.graph.task_at(ix)?;
                Some((ix, self.eft_of(ix), task.id.as_str()))
            })
            .max_by(|a, b| a.1.total_cmp(&b.1).then_with(|| b.2.cmp(a.2)))
            .map(|(ix, _, _)| ix)
    }
}
