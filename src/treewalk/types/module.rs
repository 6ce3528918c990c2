use std::{
    fmt::{Debug, Error, Formatter},
    path::PathBuf,
    ptr,
};

use crate::{
    domain::{Dunder, ModuleName, ModuleOrigin},
    treewalk::{Scope, TreewalkValue},
};

#[derive(Clone)]
pub struct Module {
    name: ModuleName,
    package: Option<ModuleName>,
    origin: ModuleOrigin,
    scope: Scope,
}

impl Debug for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "<module '{}'>", self.name)
    }
}

impl PartialEq for Module {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

impl Module {
    pub fn new(name: ModuleName, package: Option<ModuleName>, origin: ModuleOrigin) -> Self {
        let scope = init_scope(&name, package.as_ref(), &origin);

        Self {
            name,
            package,
            origin,
            scope,
        }
    }

    pub fn new_builtin(name: ModuleName) -> Self {
        let package = name.parent();
        Self::new(name, package, ModuleOrigin::Builtin)
    }

    pub fn path(&self) -> PathBuf {
        self.origin.path()
    }

    pub fn name(&self) -> &ModuleName {
        &self.name
    }

    pub fn package(&self) -> Option<&ModuleName> {
        self.package.as_ref()
    }

    pub fn origin(&self) -> &ModuleOrigin {
        &self.origin
    }

    pub fn doc(&self) -> Option<String> {
        match self.scope.get(&Dunder::Doc) {
            Some(TreewalkValue::Str(doc)) => Some(doc),
            _ => None,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn get(&self, name: &str) -> Option<TreewalkValue> {
        self.scope.get(name)
    }

    pub fn insert(&mut self, name: &str, value: TreewalkValue) {
        self.scope.insert(name, value);
    }

    pub fn delete(&mut self, name: &str) -> Option<TreewalkValue> {
        self.scope.delete(name)
    }
}

fn init_scope(name: &ModuleName, package: Option<&ModuleName>, origin: &ModuleOrigin) -> Scope {
    let mut scope = Scope::default();
    scope.insert(&Dunder::Name, TreewalkValue::Str(name.as_str()));
    scope.insert(
        &Dunder::Package,
        package
            .map(|p| TreewalkValue::Str(p.as_str()))
            .unwrap_or(TreewalkValue::None),
    );
    scope.insert(&Dunder::Doc, TreewalkValue::None);
    if let Some(file) = origin.file() {
        scope.insert(
            &Dunder::File,
            TreewalkValue::Str(file.to_string_lossy().into_owned()),
        );
    }
    scope
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dunder_attributes() {
        let module = Module::new(
            ModuleName::from_dotted("plugins.tool").unwrap(),
            ModuleName::from_dotted("plugins"),
            ModuleOrigin::File(PathBuf::from("/src/plugins/tool.py")),
        );
        assert_eq!(module.get("__name__"), Some(TreewalkValue::Str("plugins.tool".into())));
        assert_eq!(module.get("__package__"), Some(TreewalkValue::Str("plugins".into())));
        assert_eq!(
            module.get("__file__"),
            Some(TreewalkValue::Str("/src/plugins/tool.py".into()))
        );
        assert_eq!(module.doc(), None);
    }

    #[test]
    fn top_level_module_has_no_package() {
        let module = Module::new(
            ModuleName::from_dotted("tool").unwrap(),
            None,
            ModuleOrigin::Synthetic,
        );
        assert_eq!(module.get("__package__"), Some(TreewalkValue::None));
        assert_eq!(module.get("__file__"), None);
    }
}
