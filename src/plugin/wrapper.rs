use std::{
    ffi::OsStr,
    fmt::{Debug, Error, Formatter},
    path::Path,
};

use tracing::{debug, warn};

use crate::{
    domain::{ModuleName, Source},
    parser::types::Ast,
    plugin::{
        callable::{doc_of, find_class, lookup_class, resolve_callable, resolve_name, summary},
        dependencies::classify,
        Contract, Dependencies, LoadedUnit, Loader, LoaderConfig, LoaderError, PluginCallable,
        PluginClass, Signature,
    },
};

/// A loaded plugin: its source, its parsed syntax tree, and the executed module.
///
/// Construction is eager. By the time a wrapper exists the plugin's top-level code has run.
pub struct ModuleWrapper {
    source: Source,
    ast: Ast,
    unit: LoadedUnit,
    config: LoaderConfig,
}

impl ModuleWrapper {
    /// Load `path` with the default configuration into the thread's shared registry.
    ///
    /// This executes the file's top-level code with the full privileges of the host process.
    pub fn new(path: impl AsRef<OsStr>, allow_large: bool) -> Result<Self, LoaderError> {
        Loader::default().load(path, allow_large)
    }

    pub(crate) fn from_parts(source: Source, ast: Ast, unit: LoadedUnit, config: LoaderConfig) -> Self {
        Self {
            source,
            ast,
            unit,
            config,
        }
    }

    /// The canonical path of the plugin file.
    pub fn path(&self) -> &Path {
        self.source.path()
    }

    /// The qualified name the plugin is registered under.
    pub fn name(&self) -> ModuleName {
        self.unit.name()
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn unit(&self) -> &LoadedUnit {
        &self.unit
    }

    pub fn module_doc(&self) -> Option<String> {
        self.unit.module().borrow().doc()
    }

    /// Look up `name` or `Class.member` and check that it can be called.
    pub fn get_callable(&self, name: &str) -> Result<PluginCallable, LoaderError> {
        resolve_callable(&self.unit, name)
    }

    pub fn has_callable(&self, name: &str) -> bool {
        match self.get_callable(name) {
            Ok(_) => true,
            Err(e) => {
                debug!(callable = name, error = %e, "callable probe failed");
                false
            }
        }
    }

    /// The first class defined in this plugin (not imported into it) with the given name and
    /// base class. Either constraint may be omitted.
    pub fn get_class(
        &self,
        name: Option<&str>,
        must_inherit: Option<&PluginClass>,
    ) -> Option<PluginClass> {
        find_class(&self.unit, name, must_inherit)
    }

    /// Any class bound to `name` at module level, including imported ones.
    pub fn lookup_class(&self, name: &str) -> Option<PluginClass> {
        lookup_class(&self.unit, name)
    }

    pub fn get_signature(&self, name: &str) -> Result<Signature, LoaderError> {
        Ok(self.get_callable(name)?.signature())
    }

    pub fn validate_signature(&self, name: &str, contract: &Contract) -> Result<(), LoaderError> {
        let signature = self.get_signature(name)?;
        contract.check(name, &signature)?;
        Ok(())
    }

    pub fn has_signature(&self, name: &str, contract: &Contract) -> bool {
        match self.validate_signature(name, contract) {
            Ok(()) => true,
            Err(e) => {
                warn!(callable = name, error = %e, "signature probe failed");
                false
            }
        }
    }

    pub fn get_doc(&self, name: &str) -> Option<String> {
        resolve_name(&self.unit, name).ok().as_ref().and_then(doc_of)
    }

    /// The first non-blank line of the docstring of `name`.
    pub fn get_doc_summary(&self, name: &str) -> Option<String> {
        self.get_doc(name).as_deref().and_then(summary)
    }

    /// Classify the plugin's imports without executing anything further.
    pub fn get_dependencies(&self) -> Dependencies {
        classify(
            &self.ast,
            self.unit.search_paths(),
            self.config.base_prefix.as_deref(),
        )
    }
}

impl Debug for ModuleWrapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(
            f,
            "ModuleWrapper({} from {})",
            self.name(),
            self.path().display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        domain::{Type, Value},
        plugin::{test_utils::Fixture, ErrorKind},
    };

    const EXECUTE: &str = r#"
        """Runs commands."""

        def execute(command: str) -> str:
            """
            Pretend to run a command.

            Returns a description of what would have run.
            """
            return f"ran {command}"
    "#;

    #[test]
    fn load_validate_and_call() {
        let fixture = Fixture::new();
        let path = fixture.write("plugin.py", EXECUTE);
        let wrapper = fixture.loader().load(&path, false).unwrap();

        assert_eq!(wrapper.name().as_str(), "plugin");
        assert_eq!(wrapper.path(), path.as_path());
        assert_eq!(wrapper.module_doc().as_deref(), Some("Runs commands."));

        wrapper
            .validate_signature("execute", &Contract::from([("command", "str")]))
            .unwrap();
        let e = wrapper
            .validate_signature("execute", &Contract::from([("command", "int")]))
            .unwrap_err();
        assert_eq!(e.kind(), ErrorKind::ContractMismatch);
        assert!(!wrapper.has_signature("execute", &Contract::from([("command", "int")])));

        let execute = wrapper.get_callable("execute").unwrap();
        assert_eq!(execute.call(["x".into()]).unwrap(), Value::from("ran x"));
        assert_eq!(
            wrapper.get_doc_summary("execute").as_deref(),
            Some("Pretend to run a command.")
        );
    }

    #[test]
    fn contracts_need_every_listed_name() {
        let fixture = Fixture::new();
        let path = fixture.write(
            "plugin.py",
            r#"
            def execute(command: str, verbose: bool = False) -> str:
                return command
            "#,
        );
        let wrapper = fixture.loader().load(&path, false).unwrap();

        assert!(wrapper.has_signature("execute", &Contract::from([("command", "str")])));

        let contract = Contract::list([("command", Some("str")), ("timeout", Some("float"))]);
        let Err(LoaderError::ContractMismatch(mismatch)) =
            wrapper.validate_signature("execute", &contract)
        else {
            panic!("expected a contract mismatch");
        };
        assert_eq!(mismatch.parameter(), "timeout");

        let signature = wrapper.get_signature("execute").unwrap();
        let verbose = signature.parameter("verbose").unwrap();
        assert_eq!(verbose.type_hint(), "bool");
        assert_eq!(verbose.default, Some(Value::Boolean(false)));
        assert_eq!(signature.returns.as_deref(), Some("str"));
    }

    #[test]
    fn callable_lookup() {
        let fixture = Fixture::new();
        let path = fixture.write(
            "plugin.py",
            r#"
            VERSION = 3

            class Tool:
                """A tool."""

                prefix = "tool"

                def __init__(self, name):
                    self.name = name

                @staticmethod
                def describe(name: str) -> str:
                    """Describe a tool."""
                    return "tool " + name

                @classmethod
                def build(cls, name: str):
                    return cls(name)

            def fail(message):
                raise ValueError(message)
            "#,
        );
        let wrapper = fixture.loader().load(&path, false).unwrap();

        assert!(wrapper.has_callable("Tool"));
        assert!(wrapper.has_callable("Tool.describe"));
        assert!(wrapper.has_callable("Tool.build"));
        assert!(!wrapper.has_callable("Tool.missing"));
        assert!(!wrapper.has_callable("Missing.describe"));

        let describe = wrapper.get_callable("Tool.describe").unwrap();
        assert_eq!(describe.call(["x".into()]).unwrap(), Value::from("tool x"));
        assert_eq!(wrapper.get_doc("Tool.describe").as_deref(), Some("Describe a tool."));
        assert_eq!(wrapper.get_doc("Tool").as_deref(), Some("A tool."));
        assert_eq!(wrapper.get_doc("VERSION"), None);

        let built = wrapper.get_callable("Tool.build").unwrap().call(["b".into()]).unwrap();
        let Value::Opaque(handle) = built else {
            panic!("instances cross as opaque handles");
        };
        assert_eq!(handle.type_name(), "Tool");
        let names: Vec<_> = wrapper
            .get_signature("Tool.build")
            .unwrap()
            .names()
            .map(str::to_string)
            .collect();
        assert_eq!(names, vec!["name"]);

        let e = wrapper.get_callable("VERSION").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::NotCallable);
        let e = wrapper.get_callable("Tool.prefix").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::NotCallable);
        let e = wrapper.get_callable("missing").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::NotFound);

        let Err(LoaderError::Call { source, .. }) =
            wrapper.get_callable("fail").unwrap().call(["boom".into()])
        else {
            panic!("expected the plugin's exception");
        };
        assert_eq!(source.exception.get_type(), Type::ValueError);
        assert_eq!(source.exception.message(), "boom");
    }

    #[test]
    fn keyword_arguments() {
        let fixture = Fixture::new();
        let path = fixture.write(
            "plugin.py",
            r#"
            def greet(name, *, greeting="hello"):
                return greeting + " " + name
            "#,
        );
        let wrapper = fixture.loader().load(&path, false).unwrap();
        let greet = wrapper.get_callable("greet").unwrap();

        assert_eq!(greet.call(["ada".into()]).unwrap(), Value::from("hello ada"));
        assert_eq!(
            greet
                .call_with_keywords(["ada".into()], [("greeting", Value::from("hi"))])
                .unwrap(),
            Value::from("hi ada")
        );
        let e = greet
            .call_with_keywords(["ada".into()], [("tone", Value::from("loud"))])
            .unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Call);
    }

    #[test]
    fn classes_defined_here() {
        let fixture = Fixture::new();
        fixture.write(
            "base.py",
            r#"
            class Base:
                pass
            "#,
        );
        let path = fixture.write(
            "plugin.py",
            r#"
            from base import Base

            class Helper:
                pass

            class Other:
                pass
            "#,
        );
        let wrapper = fixture.loader().load(&path, false).unwrap();
        let base = wrapper.lookup_class("Base").unwrap();
        assert_eq!(base.module(), "base");

        assert_eq!(wrapper.get_class(None, Some(&base)), None);
        assert_eq!(wrapper.get_class(Some("Base"), None), None);
        assert_eq!(wrapper.get_class(None, None).unwrap().name(), "Helper");
        assert_eq!(wrapper.get_class(Some("Other"), None).unwrap().full_name(), "plugin.Other");

        let path = fixture.write(
            "derived.py",
            r#"
            from base import Base

            class Unrelated:
                pass

            class Impl(Base):
                pass
            "#,
        );
        let wrapper = fixture.loader().load(&path, false).unwrap();
        let base = wrapper.lookup_class("Base").unwrap();
        let found = wrapper.get_class(None, Some(&base)).unwrap();
        assert_eq!(found.name(), "Impl");
        assert!(found.is_subclass_of(&base));
        assert_eq!(found.bases(), vec!["base.Base"]);
    }

    #[test]
    fn dependencies_are_classified() {
        let fixture = Fixture::new();
        fixture.write("helpers.py", "");
        let path = fixture.write(
            "plugin.py",
            r#"
            import json
            import helpers

            def later():
                import definitely_missing_module
            "#,
        );
        let wrapper = fixture.loader().load(&path, false).unwrap();
        let dependencies = wrapper.get_dependencies();

        assert_eq!(dependencies.standard, vec!["json"]);
        assert_eq!(dependencies.third_party, vec!["helpers"]);
        assert_eq!(dependencies.unresolved, vec!["definitely_missing_module"]);
    }

    #[test]
    fn standard_files_under_the_base_prefix() {
        let fixture = Fixture::new();
        let prefix = fixture.mkdir("prefix");
        fixture.write("prefix/shutil.py", "");
        let path = fixture.write("plugins/plugin.py", "import shutil\n");

        let config = LoaderConfig {
            base_prefix: Some(prefix),
            ..LoaderConfig::default()
        };
        let wrapper = fixture.loader_with(config).load(&path, false).unwrap();
        assert_eq!(wrapper.get_dependencies().standard, vec!["shutil"]);
    }
}
