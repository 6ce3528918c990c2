use std::path::{Path, PathBuf};

use tracing::trace;

use crate::domain::{
    Dunder, FromImportPath, ModuleLocation, ModuleName, ModulePath, ResolvedModule,
};

#[derive(Debug, PartialEq)]
pub enum ImportResolutionError {
    NoParentPackage,
    BeyondTopLevel,
    EmptyModulePath,
}

impl ImportResolutionError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoParentPackage => "attempted relative import with no known parent package",
            Self::BeyondTopLevel => "attempted relative import beyond top-level package",
            Self::EmptyModulePath => "empty module name",
        }
    }
}

pub fn resolve_import_path(
    import_path: &FromImportPath,
    current_package: Option<&ModuleName>,
) -> Result<ModuleName, ImportResolutionError> {
    match import_path {
        FromImportPath::Absolute(mp) => resolve_absolute_path(mp),
        FromImportPath::Relative(levels, tail) => {
            let package = current_package.ok_or(ImportResolutionError::NoParentPackage)?;
            // - One leading dot (`.`) refers to the current package
            // - Additional dots (`..`, `...`) walk upward in the package hierarchy
            //
            // Since `current_package` already names the containing package,
            // we strip `levels - 1` segments to compute the base.
            let base = package
                .strip_last(levels.saturating_sub(1))
                .ok_or(ImportResolutionError::BeyondTopLevel)?;
            Ok(base.join(tail.segments_as_str()))
        }
    }
}

// Convert from a parser `ModulePath` into a runtime `ModuleName`. For absolute paths, this is a
// direct mapping.
pub fn resolve_absolute_path(
    module_path: &ModulePath,
) -> Result<ModuleName, ImportResolutionError> {
    ModuleName::from_segments(&module_path.segments_as_str())
        .ok_or(ImportResolutionError::EmptyModulePath)
}

/// Finds a module but does not read it.
///
/// Regular modules and packages win over namespace directories anywhere on the search path, which
/// mirrors how namespace portions are only considered once every regular location has been tried.
pub fn resolve(requested: &ModuleName, search_paths: &[PathBuf]) -> Option<ResolvedModule> {
    let located = search_paths
        .iter()
        .find_map(|root| find_source(root, requested.segments()))
        .or_else(|| {
            search_paths
                .iter()
                .find_map(|root| find_namespace(root, requested.segments()))
        })?;

    trace!(module = %requested, location = ?located, "resolved import");

    let package = if located.is_package() {
        Some(requested.clone())
    } else {
        requested.parent()
    };

    Some(ResolvedModule {
        name: requested.clone(),
        package,
        location: located,
    })
}

fn find_source(root: &Path, segments: &[String]) -> Option<ModuleLocation> {
    let [module_path, init_path] = expand_path(root, segments);

    if module_path.is_file() {
        return canonical(&module_path).map(ModuleLocation::Module);
    }
    if init_path.is_file() {
        return canonical(&init_path).map(ModuleLocation::Package);
    }
    None
}

fn find_namespace(root: &Path, segments: &[String]) -> Option<ModuleLocation> {
    let dir = segments.iter().fold(root.to_path_buf(), |acc, s| acc.join(s));
    if dir.is_dir() {
        canonical(&dir).map(ModuleLocation::Namespace)
    } else {
        None
    }
}

fn canonical(path: &Path) -> Option<PathBuf> {
    path.canonicalize().ok()
}

/// For a given path and segments, this returns both the `../base.py` and `../base/__init__.py`
/// versions.
fn expand_path(path: &Path, segments: &[String]) -> [PathBuf; 2] {
    let append_segment = |mut acc: PathBuf, segment: &String| {
        acc.push(segment);
        acc
    };

    let (last, rest) = match segments.split_last() {
        Some((last, rest)) => (last, rest),
        None => return [path.to_path_buf(), path.join(Dunder::Init.py_file())],
    };

    // Build the `../base/segment_one/segment_two.py` path
    let base_path = rest
        .iter()
        .fold(path.to_path_buf(), append_segment)
        .join(format!("{last}.py"));

    // Build the `../base/segment_one/segment_two/__init__.py` path
    let init_path = segments
        .iter()
        .fold(path.to_path_buf(), append_segment)
        .join(Dunder::Init.py_file());

    [base_path, init_path]
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::domain::Identifier;

    fn module_path(segments: &[&str]) -> ModulePath {
        ModulePath::new(
            segments
                .iter()
                .map(|s| Identifier::new(*s).unwrap())
                .collect(),
        )
    }

    fn name(s: &str) -> ModuleName {
        ModuleName::from_dotted(s).unwrap()
    }

    #[test]
    fn test_expand_path_with_multiple_segments() {
        let path = Path::new("/base");
        let segments = ["subdir".to_string(), "file".to_string()];

        let [base_path, init_path] = expand_path(path, &segments);

        assert_eq!(base_path, Path::new("/base/subdir/file.py"));
        assert_eq!(init_path, Path::new("/base/subdir/file/__init__.py"));
    }

    #[test]
    fn test_expand_path_with_single_segment() {
        let path = Path::new("/base");
        let segments = ["file".to_string()];

        let [base_path, init_path] = expand_path(path, &segments);

        assert_eq!(base_path, Path::new("/base/file.py"));
        assert_eq!(init_path, Path::new("/base/file/__init__.py"));
    }

    #[test]
    fn relative_import_one_level() {
        let path = FromImportPath::Relative(1, module_path(&["helper"]));
        let resolved = resolve_import_path(&path, Some(&name("pkg.sub")));
        assert_eq!(resolved, Ok(name("pkg.sub.helper")));
    }

    #[test]
    fn relative_import_two_levels() {
        let path = FromImportPath::Relative(2, module_path(&["helper"]));
        let resolved = resolve_import_path(&path, Some(&name("pkg.sub")));
        assert_eq!(resolved, Ok(name("pkg.helper")));
    }

    #[test]
    fn relative_import_bare_dot() {
        let path = FromImportPath::Relative(1, ModulePath::default());
        let resolved = resolve_import_path(&path, Some(&name("pkg")));
        assert_eq!(resolved, Ok(name("pkg")));
    }

    #[test]
    fn relative_import_without_package() {
        let path = FromImportPath::Relative(1, module_path(&["helper"]));
        let resolved = resolve_import_path(&path, None);
        assert_eq!(resolved, Err(ImportResolutionError::NoParentPackage));
    }

    #[test]
    fn relative_import_beyond_top_level() {
        let path = FromImportPath::Relative(3, module_path(&["helper"]));
        let resolved = resolve_import_path(&path, Some(&name("pkg")));
        assert_eq!(resolved, Err(ImportResolutionError::BeyondTopLevel));
    }

    #[test]
    fn resolve_prefers_module_over_namespace() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::create_dir(first.path().join("tools")).unwrap();
        fs::write(second.path().join("tools.py"), "").unwrap();

        let search = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let resolved = resolve(&name("tools"), &search).unwrap();

        assert!(matches!(resolved.location, ModuleLocation::Module(_)));
        assert_eq!(resolved.package, None);
    }

    #[test]
    fn resolve_package_and_namespace() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("pkg")).unwrap();
        fs::write(root.path().join("pkg/__init__.py"), "").unwrap();
        fs::create_dir_all(root.path().join("ns")).unwrap();

        let search = vec![root.path().to_path_buf()];

        let pkg = resolve(&name("pkg"), &search).unwrap();
        assert!(matches!(pkg.location, ModuleLocation::Package(_)));
        assert_eq!(pkg.package, Some(name("pkg")));

        let ns = resolve(&name("ns"), &search).unwrap();
        assert!(matches!(ns.location, ModuleLocation::Namespace(_)));

        assert!(resolve(&name("missing"), &search).is_none());
    }
}
