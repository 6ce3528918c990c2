use tracing::debug;

use crate::{
    core::Container,
    domain::{
        resolver::{resolve, resolve_import_path},
        FromImportPath, ModuleLocation, ModuleName, ModuleOrigin, Source, Type,
    },
    parser::{
        types::{Ast, FromImportMode, RegularImport},
        Parser,
    },
    treewalk::{
        interpreter::Frame,
        stdlib,
        types::{Exception, Module},
        Raise, TreewalkInterpreter, TreewalkResult, TreewalkValue,
    },
};

impl TreewalkInterpreter {
    /// Return the registered module called `name`, loading it (and its parent packages) first if
    /// needed. Native modules win over files of the same name on the search path.
    pub fn import_module(&self, name: &ModuleName) -> TreewalkResult<Container<Module>> {
        if let Some(module) = self.state.registry().get(name) {
            return Ok(module);
        }
        if let Some(module) = self.state.native_module(name) {
            return Ok(module);
        }

        let parent = match name.parent() {
            Some(parent_name) => {
                let parent = self.import_module(&parent_name)?;
                // Loading the parent may have created this module already.
                if let Some(module) = self
                    .state
                    .registry()
                    .get(name)
                    .or_else(|| self.state.native_module(name))
                {
                    return Ok(module);
                }
                Some(parent)
            }
            None => None,
        };

        let module = match stdlib::load(self, name) {
            Some(module) => {
                self.state.insert_native_module(module.clone());
                module
            }
            None => self.import_from_source(name)?,
        };

        if let Some(parent) = parent {
            parent
                .borrow_mut()
                .insert(name.tail(), TreewalkValue::Module(module.clone()));
        }
        Ok(module)
    }

    fn import_from_source(&self, name: &ModuleName) -> TreewalkResult<Container<Module>> {
        let Some(resolved) = resolve(name, &self.state.search_paths()) else {
            return Exception::module_not_found_error(name).raise(self);
        };

        let path = match resolved.location {
            ModuleLocation::Namespace(dir) => {
                debug!(module = %name, dir = %dir.display(), "namespace package");
                let module = Container::new(Module::new(
                    resolved.name,
                    resolved.package,
                    ModuleOrigin::Namespace(dir),
                ));
                self.state.registry().insert(module.clone());
                return Ok(module);
            }
            ModuleLocation::Module(path) | ModuleLocation::Package(path) => path,
        };

        let source = Source::from_path(&path)
            .map_err(|e| Exception::os_error(format!("{}: {e}", path.display())))
            .raise(self)?;
        let ast = Parser::parse_text(source.text())
            .map_err(|e| {
                Exception::syntax_error(format!("{} ({}, line {})", e.message(), path.display(), e.line()))
            })
            .raise(self)?;

        self.load_source_module(
            resolved.name,
            resolved.package,
            ModuleOrigin::File(source.path().to_path_buf()),
            &ast,
        )
    }

    /// Create a module for already parsed source, register it, then run its body. The module
    /// stays registered even if its body raises.
    pub fn load_source_module(
        &self,
        name: ModuleName,
        package: Option<ModuleName>,
        origin: ModuleOrigin,
        ast: &Ast,
    ) -> TreewalkResult<Container<Module>> {
        let module = Container::new(Module::new(name, package, origin));
        self.state.registry().insert(module.clone());
        self.execute_module(&module, ast)?;
        Ok(module)
    }

    /// `import a.b.c` binds `a`; `import a.b.c as x` binds the leaf module to `x`.
    pub(super) fn execute_regular_import(
        &self,
        items: &[RegularImport],
        frame: &Frame,
    ) -> TreewalkResult<()> {
        for item in items {
            let Some(name) = ModuleName::from_segments(&item.module_path.segments_as_str()) else {
                return Exception::import_error("empty module name").raise(self);
            };
            let leaf = self.import_module(&name)?;

            match &item.alias {
                Some(alias) => self.store_name(alias, TreewalkValue::Module(leaf), frame)?,
                None => {
                    let top = match name.strip_last(name.segments().len() - 1) {
                        Some(head) => self.import_module(&head)?,
                        None => leaf,
                    };
                    self.store_name(name.head(), TreewalkValue::Module(top), frame)?;
                }
            }
        }
        Ok(())
    }

    pub(super) fn execute_selective_import(
        &self,
        import_path: &FromImportPath,
        mode: &FromImportMode,
        frame: &Frame,
    ) -> TreewalkResult<()> {
        let package = frame.module.borrow().package().cloned();
        let name = resolve_import_path(import_path, package.as_ref())
            .map_err(|e| Exception::import_error(e.message()))
            .raise(self)?;
        let module = self.import_module(&name)?;

        match mode {
            FromImportMode::All => {
                for (symbol, value) in self.public_names(&module)? {
                    self.store_name(&symbol, value, frame)?;
                }
            }
            FromImportMode::List(items) => {
                for item in items {
                    let value = self.import_symbol(&module, &name, &item.symbol)?;
                    self.store_name(item.bound_name(), value, frame)?;
                }
            }
        }
        Ok(())
    }

    /// An attribute of the module, or failing that, a submodule of the same name.
    fn import_symbol(
        &self,
        module: &Container<Module>,
        name: &ModuleName,
        symbol: &str,
    ) -> TreewalkResult<TreewalkValue> {
        if let Some(value) = module.borrow().get(symbol) {
            return Ok(value);
        }

        let submodule = name.join([symbol]);
        match self.import_module(&submodule) {
            Ok(module) => Ok(TreewalkValue::Module(module)),
            Err(e) if e.exception.kind == Type::ModuleNotFoundError => {
                let origin = module.borrow().origin().path_str();
                Exception::import_error(format!(
                    "cannot import name '{symbol}' from '{name}' ({origin})"
                ))
                .raise(self)
            }
            Err(e) => Err(e),
        }
    }

    /// The bindings `from m import *` copies: `__all__` when the module defines it, otherwise
    /// every name without a leading underscore.
    fn public_names(
        &self,
        module: &Container<Module>,
    ) -> TreewalkResult<Vec<(String, TreewalkValue)>> {
        let exported = module.borrow().get("__all__");
        let Some(exported) = exported else {
            return Ok(module
                .borrow()
                .scope()
                .iter()
                .filter(|(name, _)| !name.starts_with('_'))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect());
        };

        let mut names = vec![];
        for entry in self.iterate(&exported)? {
            let symbol = entry.as_str().raise(self)?;
            let value = module.borrow().get(&symbol);
            match value {
                Some(value) => names.push((symbol, value)),
                None => {
                    let module_name = module.borrow().name().clone();
                    return Exception::attribute_error(format!(
                        "module '{module_name}' has no attribute '{symbol}'"
                    ))
                    .raise(self);
                }
            }
        }
        Ok(names)
    }
}
