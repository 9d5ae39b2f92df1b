use serde::{Deserialize, Serialize};

/// Temporary files FUSE leaves behind while an unlinked file is still open.
pub const FUSE_HIDDEN_FRAGMENT: &str = ".fuse_hidden";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Events whose path (or rename target) contains any of these are dropped.
    pub ignored_path_fragments: Vec<String>,
    /// Duration, in seconds, for tasks that appear in events but not in metadata.
    pub default_duration: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            ignored_path_fragments: vec![FUSE_HIDDEN_FRAGMENT.to_string()],
            default_duration: 0.0,
        }
    }
}

impl AnalysisConfig {
    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignored_path_fragments
            .iter()
            .any(|fragment| !fragment.is_empty() && path.contains(fragment.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ignores_fuse_hidden_files() {
        let config = AnalysisConfig::default();
        assert!(config.is_ignored("/work/.fuse_hidden000a1b2c00000003"));
        assert!(!config.is_ignored("/work/main.o"));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: AnalysisConfig = serde_json::from_str(r#"{"default_duration": 2.5}"#).unwrap();
        assert_eq!(config.default_duration, 2.5);
        assert_eq!(config.ignored_path_fragments, vec![FUSE_HIDDEN_FRAGMENT.to_string()]);
    }

    #[test]
    fn empty_fragment_matches_nothing() {
        let config = AnalysisConfig {
            ignored_path_fragments: vec![String::new()],
            default_duration: 0.0,
        };
        assert!(!config.is_ignored("/anything"));
    }
}
