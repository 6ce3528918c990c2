use std::path::PathBuf;

use crate::domain::{ModuleName, ModuleOrigin};

/// Where a module import was found on disk.
#[derive(Debug, PartialEq, Clone)]
pub enum ModuleLocation {
    /// `name.py`
    Module(PathBuf),
    /// `name/__init__.py`
    Package(PathBuf),
    /// `name/` with no `__init__.py`
    Namespace(PathBuf),
}

impl ModuleLocation {
    pub fn origin(&self) -> ModuleOrigin {
        match self {
            Self::Module(p) | Self::Package(p) => ModuleOrigin::File(p.clone()),
            Self::Namespace(p) => ModuleOrigin::Namespace(p.clone()),
        }
    }

    pub fn is_package(&self) -> bool {
        matches!(self, Self::Package(_) | Self::Namespace(_))
    }
}

/// Result of resolving a module import.
///
/// Captures the semantic identity of the module (`__name__`, `__package__`) alongside its physical
/// source location.
///
/// This struct is intentionally short-lived: it represents the boundary between import resolution
/// (what module this is) and execution (loading and evaluating its code).
#[derive(Debug, PartialEq, Clone)]
pub struct ResolvedModule {
    pub name: ModuleName,            // __name__
    pub package: Option<ModuleName>, // __package__
    pub location: ModuleLocation,
}
