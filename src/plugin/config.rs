use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::plugin::LoaderError;

/// Files larger than this are refused unless the caller opts in.
pub const DEFAULT_MAX_BYTES: u64 = 1_000_000;

/// Settings shared by every load a [`Loader`] performs.
///
/// [`Loader`]: crate::plugin::Loader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Size ceiling in bytes, bypassed by `allow_large`.
    pub max_bytes: u64,
    /// The only accepted source extension, without the dot.
    pub source_extension: String,
    /// A file whose presence marks a directory as the project root.
    pub project_marker: String,
    /// Directory under the project root that is preferred when deriving module names.
    pub source_dir: String,
    /// The base installation directory. Imports resolving to files under it are standard.
    pub base_prefix: Option<PathBuf>,
    /// Extra directories searched for imports after the plugin's own import base.
    pub search_paths: Vec<PathBuf>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            source_extension: "py".to_string(),
            project_marker: "pyproject.toml".to_string(),
            source_dir: "src".to_string(),
            base_prefix: None,
            search_paths: vec![],
        }
    }
}

impl LoaderConfig {
    pub fn from_json(text: &str) -> Result<Self, LoaderError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Every directory imports are resolved against, given the plugin's own import base.
    pub(crate) fn import_paths(&self, import_base: PathBuf) -> Vec<PathBuf> {
        let mut paths = vec![import_base];
        paths.extend(self.search_paths.iter().cloned());
        paths.extend(self.base_prefix.iter().cloned());
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::plugin::ErrorKind;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = LoaderConfig::from_json(r#"{"max_bytes": 10, "search_paths": ["/opt/lib"]}"#)
            .unwrap();
        assert_eq!(config.max_bytes, 10);
        assert_eq!(config.search_paths, vec![PathBuf::from("/opt/lib")]);
        assert_eq!(config.source_extension, "py");
        assert_eq!(config.project_marker, "pyproject.toml");
        assert_eq!(config.base_prefix, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let e = LoaderConfig::from_json(r#"{"max_size": 10}"#).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Config);
        assert!(e.to_string().contains("max_size"));
    }

    #[test]
    fn import_paths_order() {
        let config = LoaderConfig {
            base_prefix: Some(PathBuf::from("/usr/lib/python")),
            search_paths: vec![PathBuf::from("/site")],
            ..LoaderConfig::default()
        };
        assert_eq!(
            config.import_paths(PathBuf::from("/project/src")),
            vec![
                PathBuf::from("/project/src"),
                PathBuf::from("/site"),
                PathBuf::from("/usr/lib/python"),
            ]
        );
    }
}
