use std::{ffi::OsStr, path::PathBuf, rc::Rc};

use tracing::debug;

use crate::{
    core::Container,
    domain::{ModuleName, ModuleOrigin},
    plugin::{
        layout::{find_project_root, qualified_name},
        path::validate_path,
        syntax::parse_source,
        LoaderConfig, LoaderError, ModuleWrapper,
    },
    treewalk::{types::Module, ModuleRegistry, TreewalkInterpreter},
};

/// An executed plugin module together with the interpreter that ran it. Callables taken from
/// the unit run on the same interpreter.
#[derive(Clone)]
pub struct LoadedUnit {
    interpreter: Rc<TreewalkInterpreter>,
    module: Container<Module>,
    search_paths: Vec<PathBuf>,
}

impl LoadedUnit {
    pub fn name(&self) -> ModuleName {
        self.module.borrow().name().clone()
    }

    pub fn module(&self) -> &Container<Module> {
        &self.module
    }

    pub(crate) fn interpreter(&self) -> &Rc<TreewalkInterpreter> {
        &self.interpreter
    }

    /// The directories imports were resolved against while the unit executed.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }
}

/// Loads plugin files into a module registry.
///
/// Loaders built with [`Loader::new`] share one registry per thread, so a module imported by one
/// plugin is reused by the next. [`Loader::with_registry`] isolates loads from each other.
pub struct Loader {
    config: LoaderConfig,
    registry: ModuleRegistry,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

impl Loader {
    pub fn new(config: LoaderConfig) -> Self {
        Self::with_registry(config, ModuleRegistry::shared())
    }

    pub fn with_registry(config: LoaderConfig, registry: ModuleRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Validate, parse, and execute the plugin at `path`.
    ///
    /// This runs the plugin's top-level code with the full privileges of the host process. Every
    /// call executes it again, even for a path that was loaded before.
    pub fn load(
        &self,
        path: impl AsRef<OsStr>,
        allow_large: bool,
    ) -> Result<ModuleWrapper, LoaderError> {
        let validated = validate_path(path.as_ref(), allow_large, &self.config)?;
        let (source, ast) = parse_source(&validated.path)?;

        let root = find_project_root(source.path(), &self.config.project_marker);
        let qualified = qualified_name(source.path(), root.as_deref(), &self.config.source_dir)?;
        let search_paths = self.config.import_paths(qualified.import_base);

        let name = qualified.name;
        // Only a package member can import relative to itself.
        let package = name.parent();
        let interpreter = Rc::new(TreewalkInterpreter::new(
            self.registry.clone(),
            search_paths.clone(),
        ));

        debug!(module = %name, path = %source.path().display(), "registering plugin module");
        let module = interpreter
            .load_source_module(
                name.clone(),
                package,
                ModuleOrigin::File(source.path().to_path_buf()),
                &ast,
            )
            .map_err(|source| LoaderError::Load {
                module: name.as_str(),
                source,
            })?;
        debug!(module = %name, "plugin module executed");

        let unit = LoadedUnit {
            interpreter,
            module,
            search_paths,
        };
        Ok(ModuleWrapper::from_parts(
            source,
            ast,
            unit,
            self.config.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        domain::{Type, Value},
        plugin::{test_utils::Fixture, ErrorKind},
    };

    fn module(name: &str) -> ModuleName {
        ModuleName::from_dotted(name).unwrap()
    }

    #[test]
    fn rejected_before_execution() {
        let fixture = Fixture::new();
        let loader = fixture.loader();

        let e = loader.load(fixture.path("missing.py"), false).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::NotFound);

        fixture.mkdir("folder.py");
        let e = loader.load(fixture.path("folder.py"), false).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::NotAFile);

        let path = fixture.write("bad.py", "def broken(:\n    pass\n");
        let e = loader.load(&path, false).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Syntax);
        assert!(!loader.registry().contains(&module("bad")));
        assert!(loader.registry().is_empty());
    }

    #[test]
    fn large_files_need_permission() {
        let fixture = Fixture::new();
        let path = fixture.write("big.py", &format!("# {}\nVALUE = 1\n", "x".repeat(64)));
        let config = LoaderConfig {
            max_bytes: 32,
            ..LoaderConfig::default()
        };
        let loader = fixture.loader_with(config);

        let e = loader.load(&path, false).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::TooLarge);
        assert!(loader.registry().is_empty());

        let wrapper = loader.load(&path, true).unwrap();
        assert!(!wrapper.has_callable("VALUE"));
    }

    #[test]
    fn top_level_failures() {
        let fixture = Fixture::new();
        let loader = fixture.loader();

        let path = fixture.write("raises.py", "raise RuntimeError('no')\n");
        let Err(LoaderError::Load { module, source }) = loader.load(&path, false) else {
            panic!("expected a load error");
        };
        assert_eq!(module, "raises");
        assert_eq!(source.exception.get_type(), Type::RuntimeError);

        let path = fixture.write("script.py", "from . import sibling\n");
        let Err(LoaderError::Load { source, .. }) = loader.load(&path, false) else {
            panic!("expected a load error");
        };
        assert_eq!(source.exception.get_type(), Type::ImportError);
        assert_eq!(
            source.exception.message(),
            "attempted relative import with no known parent package"
        );

        let path = fixture.write("needs.py", "import not_installed_anywhere\n");
        let Err(LoaderError::Load { source, .. }) = loader.load(&path, false) else {
            panic!("expected a load error");
        };
        assert_eq!(source.exception.get_type(), Type::ModuleNotFoundError);
    }

    #[test]
    fn names_follow_the_project_layout() {
        let fixture = Fixture::project();
        fixture.write("src/tools/__init__.py", "");
        fixture.write("src/tools/common.py", "PREFIX = 'scan'\n");
        let path = fixture.write(
            "src/tools/scan.py",
            r#"
            from .common import PREFIX

            def label(target):
                return PREFIX + ":" + target
            "#,
        );

        let wrapper = fixture.loader().load(&path, false).unwrap();
        assert_eq!(wrapper.name(), module("tools.scan"));
        assert_eq!(wrapper.unit().search_paths()[0], fixture.path("src"));
        let label = wrapper.get_callable("label").unwrap();
        assert_eq!(label.call(["here".into()]).unwrap(), Value::from("scan:here"));
    }

    #[test]
    fn reloads_share_imported_modules() {
        let fixture = Fixture::project();
        fixture.write("pkg/__init__.py", "");
        fixture.write("pkg/counter.py", "count = 0\n");
        fixture.write(
            "pkg/helper.py",
            r#"
            from . import plugin

            def owner():
                return plugin.NAME
            "#,
        );
        let path = fixture.write(
            "pkg/plugin.py",
            r#"
            from . import counter, helper

            counter.count += 1
            NAME = "plugin"

            def current():
                return counter.count
            "#,
        );
        let loader = fixture.loader();

        let first = loader.load(&path, false).unwrap();
        assert_eq!(first.name(), module("pkg.plugin"));
        let current = first.get_callable("current").unwrap();
        assert_eq!(current.call([]).unwrap(), Value::Integer(1));

        // The helper imported the plugin while it was still executing.
        let helper = loader.registry().get(&module("pkg.helper")).unwrap();
        assert!(helper.borrow().get("owner").is_some());

        let second = loader.load(&path, false).unwrap();
        assert_eq!(current.call([]).unwrap(), Value::Integer(2));
        let current = second.get_callable("current").unwrap();
        assert_eq!(current.call([]).unwrap(), Value::Integer(2));
        assert!(loader.registry().contains(&module("pkg.counter")));
    }

    #[test]
    fn shared_registry_is_per_thread() {
        let a = Loader::default();
        let b = Loader::new(LoaderConfig::default());
        assert!(a.registry().same_registry(b.registry()));

        let isolated = Loader::with_registry(LoaderConfig::default(), ModuleRegistry::new());
        assert!(!a.registry().same_registry(isolated.registry()));
    }
}
