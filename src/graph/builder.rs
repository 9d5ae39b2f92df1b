use super::{AccessKind, DependencyGraph, FileAccess, FileNode, GraphNode};
use crate::classifier::{ClassifyError, Mutation, classify};
use crate::config::AnalysisConfig;
use crate::event::{OperationEvent, OperationKind};
use crate::task::{TaskMetadata, TaskNode};
use petgraph::graph::{DiGraph, NodeIndex};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Counters describing what happened to each ingested event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub applied: usize,
    pub unknown_kind: usize,
    pub ignored_path: usize,
    pub malformed: usize,
}

impl BuildStats {
    pub fn total(&self) -> usize {
        self.applied + self.unknown_kind + self.ignored_path + self.malformed
    }
}

/// Merge state of one (task, file) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PairState {
    creation: Option<AccessKind>,
    reread: Option<bool>,
}

enum Classified<'e> {
    IgnoredPath,
    Outcome(Result<Option<Mutation<'e>>, ClassifyError>),
}

fn classify_filtered<'e>(config: &AnalysisConfig, event: &'e OperationEvent) -> Classified<'e> {
    let target_ignored = event.kind() == Some(OperationKind::Rename)
        && event.rename_target().is_some_and(|to| config.is_ignored(to));
    if config.is_ignored(&event.path) || target_ignored {
        return Classified::IgnoredPath;
    }
    Classified::Outcome(classify(event))
}

/// Grows a [`DependencyGraph`] from an ordered event stream.
///
/// Mutations must be applied in stream order: a `create` overwrites the
/// creation flag of its pair while `open` only fills it in when unset.
pub struct GraphBuilder {
    config: AnalysisConfig,
    graph: DiGraph<GraphNode, FileAccess>,
    task_index: HashMap<String, NodeIndex>,
    file_index: HashMap<String, NodeIndex>,
    pairs: HashMap<(NodeIndex, NodeIndex), PairState>,
    pair_order: Vec<(NodeIndex, NodeIndex)>,
    stats: BuildStats,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl GraphBuilder {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            graph: DiGraph::new(),
            task_index: HashMap::new(),
            file_index: HashMap::new(),
            pairs: HashMap::new(),
            pair_order: Vec::new(),
            stats: BuildStats::default(),
        }
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn register_task(&mut self, task_id: &str) -> NodeIndex {
        if let Some(&ix) = self.task_index.get(task_id) {
            return ix;
        }
        let ix = self.graph.add_node(GraphNode::Task(TaskNode::new(task_id)));
        self.task_index.insert(task_id.to_string(), ix);
        ix
    }

    pub fn register_file(&mut self, path: &str) -> NodeIndex {
        if let Some(&ix) = self.file_index.get(path) {
            return ix;
        }
        let ix = self.graph.add_node(GraphNode::File(FileNode::new(path)));
        self.file_index.insert(path.to_string(), ix);
        ix
    }

    /// Registers the task (if new) and attaches its externally supplied
    /// duration and CPU figures.
    pub fn register_metadata(&mut self, metadata: &TaskMetadata) {
        let ix = self.register_task(&metadata.task_id);
        self.update_task(ix, |task| task.apply_metadata(metadata));
    }

    pub fn register_all_metadata(&mut self, metadata: &[TaskMetadata]) {
        for entry in metadata {
            self.register_metadata(entry);
        }
    }

    /// Classifies and applies one event. Malformed events are logged and
    /// dropped; the rest of the stream is unaffected.
    pub fn ingest(&mut self, event: &OperationEvent) {
        let classified = classify_filtered(&self.config, event);
        self.absorb(event, classified);
    }

    /// Classifies the whole batch in parallel, then applies the results
    /// sequentially in stream order.
    pub fn ingest_all(&mut self, events: &[OperationEvent]) {
        let config = &self.config;
        let classified: Vec<Classified<'_>> = events
            .par_iter()
            .map(|event| classify_filtered(config, event))
            .collect();
        for (event, outcome) in events.iter().zip(classified) {
            self.absorb(event, outcome);
        }
    }

    fn absorb(&mut self, event: &OperationEvent, classified: Classified<'_>) {
        match classified {
            Classified::IgnoredPath => {
                debug!(task_id = %event.task_id, path = %event.path, "skipping ignored path");
                self.stats.ignored_path += 1;
            }
            Classified::Outcome(Ok(None)) => {
                debug!(operation = %event.operation, "skipping unknown operation kind");
                self.stats.unknown_kind += 1;
            }
            Classified::Outcome(Err(err)) => {
                warn!(error = %err, "dropping malformed event");
                self.stats.malformed += 1;
            }
            Classified::Outcome(Ok(Some(mutation))) => {
                self.apply(&mutation);
                self.stats.applied += 1;
            }
        }
    }

    pub fn apply(&mut self, mutation: &Mutation<'_>) {
        match *mutation {
            Mutation::Create {
                task_id,
                path,
                elapsed_ns,
            } => {
                let task = self.register_task(task_id);
                let file = self.register_file(path);
                self.add_metadata_time(task, elapsed_ns);
                self.pair(task, file).creation = Some(AccessKind::Produces);
            }
            Mutation::Open {
                task_id,
                path,
                elapsed_ns,
                size,
            } => {
                let task = self.register_task(task_id);
                let file = self.register_file(path);
                self.add_metadata_time(task, elapsed_ns);
                self.pair(task, file)
                    .creation
                    .get_or_insert(AccessKind::Consumes);
                self.raise_size(file, size);
            }
            Mutation::Close {
                task_id,
                path,
                elapsed_ns,
                size,
                io,
            } => {
                let task = self.register_task(task_id);
                let file = self.register_file(path);
                self.add_metadata_time(task, elapsed_ns);
                self.update_task(task, |node| {
                    node.blocking_time_ns =
                        node.blocking_time_ns.saturating_add(io.blocking_time_ns());
                    node.io_operations = node.io_operations.saturating_add(io.operations());
                });
                self.raise_size(file, size);
                let pair = self.pair(task, file);
                if io.read_count != 0 {
                    pair.reread = Some(true);
                } else {
                    pair.reread.get_or_insert(false);
                }
            }
            Mutation::Metadata {
                task_id,
                elapsed_ns,
                ..
            } => {
                let task = self.register_task(task_id);
                self.add_metadata_time(task, elapsed_ns);
            }
            Mutation::Rename {
                task_id,
                from,
                to,
                size,
            } => {
                let task = self.register_task(task_id);
                let from_ix = self.register_file(from);
                let to_ix = self.register_file(to);
                self.pair(task, from_ix)
                    .creation
                    .get_or_insert(AccessKind::Consumes);
                self.pair(task, to_ix).creation = Some(AccessKind::Produces);
                // Both sizes are overwritten, not maxed as open/close do.
                self.set_size(from_ix, size);
                self.set_size(to_ix, size);
            }
        }
    }

    /// Draws the oriented edges and returns the finished graph.
    pub fn finish(mut self) -> DependencyGraph {
        let default_duration = self.config.default_duration;
        let mut missing_metadata = 0usize;
        for node in self.graph.node_weights_mut() {
            if let GraphNode::Task(task) = node {
                if !task.has_metadata {
                    task.duration = default_duration;
                    missing_metadata += 1;
                }
            }
        }
        if missing_metadata > 0 {
            warn!(
                tasks = missing_metadata,
                default_duration, "tasks without metadata use the default duration"
            );
        }

        let mut rereads = HashSet::new();
        for key in &self.pair_order {
            let Some(state) = self.pairs.get(key) else {
                continue;
            };
            let (task, file) = *key;
            let reread = state.reread == Some(true);
            if reread {
                rereads.insert(*key);
            }
            match state.creation {
                Some(AccessKind::Produces) => {
                    self.graph.add_edge(
                        task,
                        file,
                        FileAccess {
                            kind: AccessKind::Produces,
                            reread,
                        },
                    );
                }
                Some(AccessKind::Consumes) => {
                    self.graph.add_edge(
                        file,
                        task,
                        FileAccess {
                            kind: AccessKind::Consumes,
                            reread,
                        },
                    );
                }
                None => {}
            }
        }

        info!(
            tasks = self.task_index.len(),
            files = self.file_index.len(),
            edges = self.graph.edge_count(),
            applied = self.stats.applied,
            malformed = self.stats.malformed,
            "dependency graph built"
        );

        DependencyGraph {
            graph: self.graph,
            task_index: self.task_index,
            file_index: self.file_index,
            rereads,
        }
    }

    fn pair(&mut self, task: NodeIndex, file: NodeIndex) -> &mut PairState {
        let key = (task, file);
        if !self.pairs.contains_key(&key) {
            self.pair_order.push(key);
        }
        self.pairs.entry(key).or_default()
    }

    fn update_task(&mut self, ix: NodeIndex, update: impl FnOnce(&mut TaskNode)) {
        if let Some(GraphNode::Task(task)) = self.graph.node_weight_mut(ix) {
            update(task);
        }
    }

    fn add_metadata_time(&mut self, ix: NodeIndex, elapsed_ns: u64) {
        self.update_task(ix, |task| {
            task.metadata_time_ns = task.metadata_time_ns.saturating_add(elapsed_ns);
        });
    }

    fn raise_size(&mut self, ix: NodeIndex, size: u64) {
        if let Some(GraphNode::File(file)) = self.graph.node_weight_mut(ix) {
            file.size = file.size.max(size);
        }
    }

    fn set_size(&mut self, ix: NodeIndex, size: u64) {
        if let Some(GraphNode::File(file)) = self.graph.node_weight_mut(ix) {
            file.size = size;
        }
    }
}

/// Builds a graph from task metadata and an ordered event stream.
pub fn build_graph(
    config: AnalysisConfig,
    metadata: &[TaskMetadata],
    events: &[OperationEvent],
) -> DependencyGraph {
    let mut builder = GraphBuilder::new(config);
    builder.register_all_metadata(metadata);
    builder.ingest_all(events);
    builder.finish()
}
