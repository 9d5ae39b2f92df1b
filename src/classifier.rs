//! Translation of operation events into graph mutations.
//!
//! Attribute bags are validated here, once, so that the graph builder only
//! ever sees the fields a given operation actually needs.

use crate::event::{OperationEvent, OperationKind};
use thiserror::Error;

pub const ATTR_ELAPSED: &str = "t";
pub const ATTR_SIZE: &str = "size";
pub const ATTR_READ_COUNT: &str = "r_num";
pub const ATTR_WRITE_COUNT: &str = "w_num";
pub const ATTR_READ_TIME: &str = "r_time";
pub const ATTR_WRITE_TIME: &str = "w_time";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("{kind} event for task {task_id} is missing attribute '{attribute}'")]
    MissingAttribute {
        task_id: String,
        kind: OperationKind,
        attribute: &'static str,
    },
    #[error("{kind} event for task {task_id} has non-numeric {attribute}={value:?}")]
    InvalidAttribute {
        task_id: String,
        kind: OperationKind,
        attribute: &'static str,
        value: String,
    },
    #[error("rename event for task {task_id} on {path} has no target path")]
    MissingRenameTarget { task_id: String, path: String },
}

/// Read/write accounting carried by a `close` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IoCounters {
    pub read_count: u64,
    pub write_count: u64,
    pub read_time_ns: u64,
    pub write_time_ns: u64,
}

impl IoCounters {
    pub fn blocking_time_ns(&self) -> u64 {
        self.read_time_ns.saturating_add(self.write_time_ns)
    }

    pub fn operations(&self) -> u64 {
        self.read_count.saturating_add(self.write_count)
    }
}

/// A single graph mutation derived from one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation<'a> {
    /// Task produced the file; overwrites any earlier flag for the pair.
    Create {
        task_id: &'a str,
        path: &'a str,
        elapsed_ns: u64,
    },
    /// Task accessed the file; flagged consumed unless already flagged.
    Open {
        task_id: &'a str,
        path: &'a str,
        elapsed_ns: u64,
        size: u64,
    },
    Close {
        task_id: &'a str,
        path: &'a str,
        elapsed_ns: u64,
        size: u64,
        io: IoCounters,
    },
    /// getattr / readdir / mkdir / unlink: time only, no edge.
    Metadata {
        task_id: &'a str,
        kind: OperationKind,
        elapsed_ns: u64,
    },
    Rename {
        task_id: &'a str,
        from: &'a str,
        to: &'a str,
        size: u64,
    },
}

impl<'a> Mutation<'a> {
    pub fn task_id(&self) -> &'a str {
        match self {
            Mutation::Create { task_id, .. }
            | Mutation::Open { task_id, .. }
            | Mutation::Close { task_id, .. }
            | Mutation::Metadata { task_id, .. }
            | Mutation::Rename { task_id, .. } => *task_id,
        }
    }
}

/// Classifies one event.
///
/// Returns `Ok(None)` for operation kinds outside the known vocabulary and
/// `Err` when a required attribute is missing or not an unsigned integer.
pub fn classify(event: &OperationEvent) -> Result<Option<Mutation<'_>>, ClassifyError> {
    let Some(kind) = event.kind() else {
        return Ok(None);
    };
    let fields = Fields { event, kind };
    let task_id = event.task_id.as_str();
    let path = event.path.as_str();

    let mutation = match kind {
        OperationKind::Create => Mutation::Create {
            task_id,
            path,
            elapsed_ns: fields.require(ATTR_ELAPSED)?,
        },
        OperationKind::Open => Mutation::Open {
            task_id,
            path,
            elapsed_ns: fields.require(ATTR_ELAPSED)?,
            size: fields.require(ATTR_SIZE)?,
        },
        OperationKind::Close => Mutation::Close {
            task_id,
            path,
            elapsed_ns: fields.require(ATTR_ELAPSED)?,
            size: fields.require(ATTR_SIZE)?,
            io: IoCounters {
                read_count: fields.require(ATTR_READ_COUNT)?,
                write_count: fields.require(ATTR_WRITE_COUNT)?,
                read_time_ns: fields.require(ATTR_READ_TIME)?,
                write_time_ns: fields.require(ATTR_WRITE_TIME)?,
            },
        },
        OperationKind::Getattr
        | OperationKind::Readdir
        | OperationKind::Mkdir
        | OperationKind::Unlink => Mutation::Metadata {
            task_id,
            kind,
            elapsed_ns: fields.require(ATTR_ELAPSED)?,
        },
        OperationKind::Rename => {
            let to = event
                .rename_target()
                .ok_or_else(|| ClassifyError::MissingRenameTarget {
                    task_id: event.task_id.clone(),
                    path: event.path.clone(),
                })?;
            Mutation::Rename {
                task_id,
                from: path,
                to,
                size: fields.require(ATTR_SIZE)?,
            }
        }
    };

    Ok(Some(mutation))
}

struct Fields<'e> {
    event: &'e OperationEvent,
    kind: OperationKind,
}

impl Fields<'_> {
    fn require(&self, attribute: &'static str) -> Result<u64, ClassifyError> {
        let raw = self
            .event
            .attr(attribute)
            .ok_or_else(|| ClassifyError::MissingAttribute {
                task_id: self.event.task_id.clone(),
                kind: self.kind,
                attribute,
            })?;
        raw.trim()
            .parse::<u64>()
            .map_err(|_| ClassifyError::InvalidAttribute {
                task_id: self.event.task_id.clone(),
                kind: self.kind,
                attribute,
                value: raw.to_string(),
            })
    }
}
