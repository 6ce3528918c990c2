use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{domain::ModuleName, plugin::LoaderError};

/// Where a plugin sits in its project: the dotted name it is registered under, and the directory
/// that name is relative to. The latter is where its sibling and parent packages are found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    pub name: ModuleName,
    pub import_base: PathBuf,
}

/// The nearest ancestor of `path` containing `marker`. The filesystem root is never tested.
pub fn find_project_root(path: &Path, marker: &str) -> Option<PathBuf> {
    let root = path
        .ancestors()
        .skip(1)
        .filter(|dir| dir.parent().is_some())
        .find(|dir| dir.join(marker).exists())?;
    debug!(root = %root.display(), "project root found");
    Some(root.to_path_buf())
}

/// Derive the module name of `path`, preferring `root/source_dir` over `root` itself and falling
/// back to the bare file stem.
pub fn qualified_name(
    path: &Path,
    root: Option<&Path>,
    source_dir: &str,
) -> Result<QualifiedName, LoaderError> {
    let bases = root
        .map(|root| [root.join(source_dir), root.to_path_buf()])
        .into_iter()
        .flatten();

    for base in bases {
        let Ok(relative) = path.strip_prefix(&base) else {
            continue;
        };
        let segments: Option<Vec<String>> = relative
            .with_extension("")
            .components()
            .map(|c| c.as_os_str().to_str().map(str::to_string))
            .collect();
        if let Some(name) = segments.and_then(ModuleName::new) {
            debug!(module = %name, base = %base.display(), "qualified name resolved");
            return Ok(QualifiedName {
                name,
                import_base: base,
            });
        }
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let name = ModuleName::from_segments(&[stem])
        .ok_or_else(|| LoaderError::input(format!("{} has no file stem", path.display())))?;
    let import_base = path.parent().map(Path::to_path_buf).unwrap_or_default();
    debug!(module = %name, "no project layout, using the file stem");
    Ok(QualifiedName { name, import_base })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn dotted(name: &QualifiedName) -> String {
        name.name.as_str()
    }

    #[test]
    fn finds_the_nearest_marker() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        touch(&root.join("pyproject.toml"));
        touch(&root.join("pkg/sub/pyproject.toml"));
        let file = root.join("pkg/sub/deep/tool.py");
        touch(&file);

        assert_eq!(
            find_project_root(&file, "pyproject.toml"),
            Some(root.join("pkg/sub"))
        );
        assert_eq!(find_project_root(&file, "setup.cfg"), None);
    }

    #[test]
    fn src_layout_wins() {
        let root = PathBuf::from("/work/project");
        let name = qualified_name(&root.join("src/pkg/tool.py"), Some(&root), "src").unwrap();
        assert_eq!(dotted(&name), "pkg.tool");
        assert_eq!(name.import_base, root.join("src"));
    }

    #[test]
    fn flat_layout_and_fallback() {
        let root = PathBuf::from("/work/project");
        let name = qualified_name(&root.join("pkg/tool.py"), Some(&root), "src").unwrap();
        assert_eq!(dotted(&name), "pkg.tool");
        assert_eq!(name.import_base, root);

        let name = qualified_name(Path::new("/elsewhere/tool.py"), Some(&root), "src").unwrap();
        assert_eq!(dotted(&name), "tool");
        assert_eq!(name.import_base, PathBuf::from("/elsewhere"));

        let name = qualified_name(Path::new("/scripts/tool.py"), None, "src").unwrap();
        assert_eq!(dotted(&name), "tool");
        assert_eq!(name.import_base, PathBuf::from("/scripts"));
    }
}
