//! Bipartite task/file dependency graph.
//!
//! Task nodes and file nodes live in one `petgraph` digraph. A `Produces`
//! edge points task -> file, a `Consumes` edge points file -> task, so the
//! producers of a file are its incoming neighbours and the inputs of a task
//! are its incoming neighbours too.

use crate::task::TaskNode;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

pub mod builder;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub path: String,
    pub size: u64,
}

impl FileNode {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            size: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GraphNode {
    Task(TaskNode),
    File(FileNode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessKind {
    Produces,
    Consumes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileAccess {
    pub kind: AccessKind,
    pub reread: bool,
}

/// Borrowed view of one task/file edge, oriented by `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeView<'g> {
    pub task: &'g str,
    pub file: &'g str,
    pub kind: AccessKind,
    pub reread: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    pub(crate) graph: DiGraph<GraphNode, FileAccess>,
    pub(crate) task_index: HashMap<String, NodeIndex>,
    pub(crate) file_index: HashMap<String, NodeIndex>,
    /// (task, file) pairs with an observed non-zero read, edge or not.
    rereads: HashSet<(NodeIndex, NodeIndex)>,
}

impl DependencyGraph {
    pub fn is_empty(&self) -> bool {
        self.task_index.is_empty()
    }

    pub fn task_count(&self) -> usize {
        self.task_index.len()
    }

    pub fn file_count(&self) -> usize {
        self.file_index.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn task(&self, task_id: &str) -> Option<&TaskNode> {
        self.task_index
            .get(task_id)
            .and_then(|&ix| self.task_at(ix))
    }

    pub fn file(&self, path: &str) -> Option<&FileNode> {
        self.file_index.get(path).and_then(|&ix| self.file_at(ix))
    }

    pub fn task_at(&self, ix: NodeIndex) -> Option<&TaskNode> {
        match self.graph.node_weight(ix) {
            Some(GraphNode::Task(task)) => Some(task),
            _ => None,
        }
    }

    pub fn file_at(&self, ix: NodeIndex) -> Option<&FileNode> {
        match self.graph.node_weight(ix) {
            Some(GraphNode::File(file)) => Some(file),
            _ => None,
        }
    }

    /// Task nodes in first-reference order.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskNode> + '_ {
        self.graph.node_indices().filter_map(|ix| self.task_at(ix))
    }

    /// Task node indices in first-reference order.
    pub fn task_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .node_indices()
            .filter(|&ix| matches!(self.graph[ix], GraphNode::Task(_)))
    }

    /// File nodes in first-reference order.
    pub fn files(&self) -> impl Iterator<Item = &FileNode> + '_ {
        self.graph.node_indices().filter_map(|ix| self.file_at(ix))
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeView<'_>> + '_ {
        self.graph.edge_references().filter_map(|edge| {
            let access = edge.weight();
            let (task_ix, file_ix) = match access.kind {
                AccessKind::Produces => (edge.source(), edge.target()),
                AccessKind::Consumes => (edge.target(), edge.source()),
            };
            Some(EdgeView {
                task: self.task_at(task_ix)?.id.as_str(),
                file: self.file_at(file_ix)?.path.as_str(),
                kind: access.kind,
                reread: access.reread,
            })
        })
    }

    /// Orientation of the (task, file) edge, if one was drawn.
    pub fn access(&self, task_id: &str, path: &str) -> Option<AccessKind> {
        let task_ix = *self.task_index.get(task_id)?;
        let file_ix = *self.file_index.get(path)?;
        if self.graph.contains_edge(task_ix, file_ix) {
            Some(AccessKind::Produces)
        } else if self.graph.contains_edge(file_ix, task_ix) {
            Some(AccessKind::Consumes)
        } else {
            None
        }
    }

    pub fn is_reread(&self, task_id: &str, path: &str) -> bool {
        match (self.task_index.get(task_id), self.file_index.get(path)) {
            (Some(&task_ix), Some(&file_ix)) => self.rereads.contains(&(task_ix, file_ix)),
            _ => false,
        }
    }

    /// Tasks that produced any file consumed by `task_id`, sorted by id.
    /// Unknown tasks have no parents.
    pub fn parents(&self, task_id: &str) -> Vec<&str> {
        let Some(&ix) = self.task_index.get(task_id) else {
            return Vec::new();
        };
        self.parent_indices(ix)
            .into_iter()
            .filter_map(|p| self.task_at(p).map(|task| task.id.as_str()))
            .collect()
    }

    /// Index form of [`DependencyGraph::parents`], sorted by task id.
    pub fn parent_indices(&self, task_ix: NodeIndex) -> Vec<NodeIndex> {
        let mut parents: BTreeMap<&str, NodeIndex> = BTreeMap::new();
        for file_ix in self.graph.neighbors_directed(task_ix, Direction::Incoming) {
            for producer_ix in self.graph.neighbors_directed(file_ix, Direction::Incoming) {
                if let Some(task) = self.task_at(producer_ix) {
                    parents.insert(task.id.as_str(), producer_ix);
                }
            }
        }
        parents.into_values().collect()
    }

    pub fn producers(&self, path: &str) -> Vec<&str> {
        self.file_neighbours(path, Direction::Incoming)
    }

    pub fn consumers(&self, path: &str) -> Vec<&str> {
        self.file_neighbours(path, Direction::Outgoing)
    }

    /// Tasks reached from `task_id` through `path`: empty unless `task_id`
    /// produced `path`.
    pub fn children_via(&self, task_id: &str, path: &str) -> Vec<&str> {
        if self.access(task_id, path) != Some(AccessKind::Produces) {
            return Vec::new();
        }
        self.consumers(path)
    }

    /// Files produced by `producer` and consumed by `consumer`, sorted by path.
    pub fn shared_files(&self, producer: &str, consumer: &str) -> Vec<&str> {
        match (self.task_index.get(producer), self.task_index.get(consumer)) {
            (Some(&p), Some(&c)) => self
                .shared_file_indices(p, c)
                .into_iter()
                .filter_map(|ix| self.file_at(ix).map(|file| file.path.as_str()))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn shared_file_indices(&self, producer: NodeIndex, consumer: NodeIndex) -> Vec<NodeIndex> {
        let produced: HashSet<NodeIndex> = self
            .graph
            .neighbors_directed(producer, Direction::Outgoing)
            .collect();
        let shared: BTreeMap<&str, NodeIndex> = self
            .graph
            .neighbors_directed(consumer, Direction::Incoming)
            .filter(|ix| produced.contains(ix))
            .filter_map(|ix| self.file_at(ix).map(|file| (file.path.as_str(), ix)))
            .collect();
        shared.into_values().collect()
    }

    fn file_neighbours(&self, path: &str, direction: Direction) -> Vec<&str> {
        let Some(&file_ix) = self.file_index.get(path) else {
            return Vec::new();
        };
        let ids: BTreeSet<&str> = self
            .graph
            .neighbors_directed(file_ix, direction)
            .filter_map(|ix| self.task_at(ix).map(|task| task.id.as_str()))
            .collect();
        ids.into_iter().collect()
    }
}
