use std::path::{Path, PathBuf};

#[derive(Debug, PartialEq, Clone)]
pub enum ModuleOrigin {
    /// Backed by a single source file.
    File(PathBuf),
    /// A directory without an `__init__.py`; there is no single backing file.
    Namespace(PathBuf),
    /// Implemented natively by the interpreter.
    Builtin,
    Synthetic,
}

impl ModuleOrigin {
    pub fn path(&self) -> PathBuf {
        match self {
            ModuleOrigin::File(p) | ModuleOrigin::Namespace(p) => p.to_path_buf(),
            ModuleOrigin::Builtin => PathBuf::from("<builtin>"),
            ModuleOrigin::Synthetic => PathBuf::from("<synthetic>"),
        }
    }

    /// The backing file, if there is exactly one.
    pub fn file(&self) -> Option<&Path> {
        match self {
            ModuleOrigin::File(p) => Some(p),
            _ => None,
        }
    }

    pub fn path_str(&self) -> String {
        self.path().to_string_lossy().into_owned()
    }
}
