use std::{fs, path::PathBuf};

use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

use crate::{
    plugin::{Loader, LoaderConfig},
    treewalk::ModuleRegistry,
};

/// A throwaway directory tree of plugin sources.
pub struct Fixture {
    dir: TempDir,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    pub fn new() -> Self {
        init_tracing();
        Self {
            dir: TempDir::new().expect("Failed to create fixture directory"),
        }
    }

    /// A fixture whose root carries a `pyproject.toml`.
    pub fn project() -> Self {
        let fixture = Self::new();
        fixture.write("pyproject.toml", "[project]\nname = \"fixture\"\n");
        fixture
    }

    /// The canonical root, so paths compare equal to what the loader reports.
    pub fn root(&self) -> PathBuf {
        self.dir
            .path()
            .canonicalize()
            .expect("Failed to canonicalize fixture root")
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write `text` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, text: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create fixture directories");
        }
        fs::write(&path, unindent(text)).expect("Failed to write fixture file");
        path
    }

    pub fn mkdir(&self, relative: &str) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(&path).expect("Failed to create fixture directory");
        path
    }

    /// A loader with its own registry, so tests do not see each other's modules.
    pub fn loader(&self) -> Loader {
        Loader::with_registry(LoaderConfig::default(), ModuleRegistry::new())
    }

    pub fn loader_with(&self, config: LoaderConfig) -> Loader {
        Loader::with_registry(config, ModuleRegistry::new())
    }
}

/// Route log output through the test harness. Set `RUST_LOG=modwrap=debug` to see it.
pub fn init_tracing() {
    // Another test may have installed it already.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Strip the common indentation so fixture sources can be written inline.
fn unindent(text: &str) -> String {
    let text = text.strip_prefix('\n').unwrap_or(text);
    let indent = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    let mut out = String::new();
    for line in text.lines() {
        out.push_str(line.get(indent..).unwrap_or(line.trim_start()));
        out.push('\n');
    }
    out
}
