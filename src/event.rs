use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// File-system operations recorded by the tracer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Open,
    Close,
    Getattr,
    Readdir,
    Mkdir,
    Unlink,
    Rename,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Open => "open",
            OperationKind::Close => "close",
            OperationKind::Getattr => "getattr",
            OperationKind::Readdir => "readdir",
            OperationKind::Mkdir => "mkdir",
            OperationKind::Unlink => "unlink",
            OperationKind::Rename => "rename",
        }
    }

    /// Accepts both the bare verb and the past-tense form the access log writes
    /// (`created`, `opened`, `closed`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "create" | "created" => Some(OperationKind::Create),
            "open" | "opened" => Some(OperationKind::Open),
            "close" | "closed" => Some(OperationKind::Close),
            "getattr" => Some(OperationKind::Getattr),
            "readdir" => Some(OperationKind::Readdir),
            "mkdir" => Some(OperationKind::Mkdir),
            "unlink" => Some(OperationKind::Unlink),
            "rename" | "renamed" => Some(OperationKind::Rename),
            _ => None,
        }
    }

    pub fn is_metadata_only(&self) -> bool {
        matches!(
            self,
            OperationKind::Getattr
                | OperationKind::Readdir
                | OperationKind::Mkdir
                | OperationKind::Unlink
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown operation kind '{s}'"))
    }
}

/// One file operation attributed to a task, as handed over by log ingestion.
///
/// `operation` keeps the raw vocabulary of the log so that kinds this crate
/// does not know about can be skipped instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationEvent {
    pub task_id: String,
    pub operation: String,
    pub path: String,
    #[serde(default, deserialize_with = "scalar_attributes")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_path: Option<String>,
}

impl OperationEvent {
    pub fn new(
        task_id: impl Into<String>,
        operation: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            operation: operation.into(),
            path: path.into(),
            attributes: BTreeMap::new(),
            to_path: None,
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.insert(key.into(), value.to_string());
        self
    }

    pub fn with_to_path(mut self, to_path: impl Into<String>) -> Self {
        self.to_path = Some(to_path.into());
        self
    }

    pub fn kind(&self) -> Option<OperationKind> {
        OperationKind::parse(&self.operation)
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Rename target: the explicit field wins over the log's `to=` attribute.
    pub fn rename_target(&self) -> Option<&str> {
        self.to_path.as_deref().or_else(|| self.attr("to"))
    }
}

/// Keeps scalar attribute values as strings. Nulls, arrays and objects are
/// dropped; an operation that needs such a key then sees it as missing.
fn scalar_attributes<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::String(s) => Some((key, s)),
            serde_json::Value::Number(n) => Some((key, n.to_string())),
            serde_json::Value::Bool(b) => Some((key, b.to_string())),
            _ => None,
        })
        .collect())
}
