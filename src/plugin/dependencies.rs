use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use serde::Serialize;
use tracing::trace;

use crate::{
    domain::{resolver::resolve, FromImportPath, ModuleLocation, ModuleName},
    parser::types::{Ast, Statement, StatementKind},
    treewalk::stdlib,
};

/// The top-level names a plugin imports, split by where they resolve. Each set is sorted and no
/// name appears in more than one.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Dependencies {
    pub standard: Vec<String>,
    pub third_party: Vec<String>,
    pub unresolved: Vec<String>,
}

/// Where an import would come from if it were executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provenance {
    Standard,
    ThirdParty,
    Unresolved,
}

/// Sort every absolute import in `ast` into standard, third-party, or unresolved. Nothing is
/// executed: names are only located on `search_paths`.
pub fn classify(ast: &Ast, search_paths: &[PathBuf], base_prefix: Option<&Path>) -> Dependencies {
    let base_prefix = base_prefix.map(|p| p.canonicalize().unwrap_or_else(|_| p.to_path_buf()));
    let mut dependencies = Dependencies::default();

    for name in imported_names(ast) {
        let provenance = provenance(&name, search_paths, base_prefix.as_deref());
        trace!(import = %name, ?provenance, "classified import");
        match provenance {
            Provenance::Standard => dependencies.standard.push(name),
            Provenance::ThirdParty => dependencies.third_party.push(name),
            Provenance::Unresolved => dependencies.unresolved.push(name),
        }
    }
    dependencies
}

fn provenance(name: &str, search_paths: &[PathBuf], base_prefix: Option<&Path>) -> Provenance {
    if stdlib::is_native(name) {
        return Provenance::Standard;
    }
    let Some(module) = ModuleName::from_dotted(name) else {
        return Provenance::Unresolved;
    };
    match resolve(&module, search_paths).map(|r| r.location) {
        Some(ModuleLocation::Module(file) | ModuleLocation::Package(file)) => {
            match base_prefix {
                Some(prefix) if file.starts_with(prefix) => Provenance::Standard,
                _ => Provenance::ThirdParty,
            }
        }
        // No single backing file to judge by.
        Some(ModuleLocation::Namespace(_)) => Provenance::ThirdParty,
        None => Provenance::Unresolved,
    }
}

/// The first segment of every `import a.b` and absolute `from a.b import c`, at any depth.
pub fn imported_names(ast: &Ast) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    collect(ast, &mut names);
    names
}

fn collect(block: &[Statement], names: &mut BTreeSet<String>) {
    for statement in block {
        match &statement.kind {
            StatementKind::RegularImport(items) => {
                for item in items {
                    if let Some(head) = item.module_path.head() {
                        names.insert(head.to_string());
                    }
                }
            }
            StatementKind::SelectiveImport {
                import_path: FromImportPath::Absolute(path),
                ..
            } => {
                if let Some(head) = path.head() {
                    names.insert(head.to_string());
                }
            }
            StatementKind::FunctionDef(def) => collect(&def.body, names),
            StatementKind::ClassDef(def) => collect(&def.body, names),
            StatementKind::IfElse {
                if_part,
                elif_parts,
                else_part,
            } => {
                collect(&if_part.ast, names);
                for part in elif_parts {
                    collect(&part.ast, names);
                }
                if let Some(block) = else_part {
                    collect(block, names);
                }
            }
            StatementKind::WhileLoop {
                body, else_block, ..
            }
            | StatementKind::ForInLoop {
                body, else_block, ..
            } => {
                collect(body, names);
                if let Some(block) = else_block {
                    collect(block, names);
                }
            }
            StatementKind::TryExcept {
                try_block,
                handlers,
                else_block,
                finally_block,
            } => {
                collect(try_block, names);
                for handler in handlers {
                    collect(&handler.block, names);
                }
                for block in [else_block, finally_block].into_iter().flatten() {
                    collect(block, names);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    use crate::{domain::Text, parser::Parser};

    fn parse(text: &str) -> Ast {
        Parser::parse_text(&Text::new(text)).unwrap()
    }

    #[test]
    fn collects_nested_absolute_imports() {
        let ast = parse(
            r#"
import os.path, json as j
from typing import Any
from . import sibling
from .helpers import tool

def run():
    import requests

class Tool:
    if True:
        from yaml.loader import Loader
    else:
        pass

try:
    import numpy
except ImportError:
    from fallback import numpy
"#,
        );
        let names: Vec<_> = imported_names(&ast).into_iter().collect();
        assert_eq!(
            names,
            vec!["fallback", "json", "numpy", "os", "requests", "typing", "yaml"]
        );
    }

    #[test]
    fn classification() {
        let prefix = TempDir::new().unwrap();
        let site = TempDir::new().unwrap();
        fs::write(prefix.path().join("shutil.py"), "").unwrap();
        fs::create_dir(site.path().join("requests")).unwrap();
        fs::write(site.path().join("requests/__init__.py"), "").unwrap();
        fs::create_dir(site.path().join("zope")).unwrap();

        let ast = parse("import shutil, requests, zope, math, missing_thing\n");
        let search = vec![site.path().to_path_buf(), prefix.path().to_path_buf()];
        let dependencies = classify(&ast, &search, Some(prefix.path()));

        assert_eq!(dependencies.standard, vec!["math", "shutil"]);
        assert_eq!(dependencies.third_party, vec!["requests", "zope"]);
        assert_eq!(dependencies.unresolved, vec!["missing_thing"]);
    }

    #[test]
    fn without_a_prefix_files_are_third_party() {
        let site = TempDir::new().unwrap();
        fs::write(site.path().join("shutil.py"), "").unwrap();
        let ast = parse("import shutil\n");
        let dependencies = classify(&ast, &[site.path().to_path_buf()], None);
        assert_eq!(dependencies.third_party, vec!["shutil"]);
        assert!(dependencies.standard.is_empty());
    }
}
