use std::{
    collections::HashMap,
    fmt::{Debug, Error, Formatter},
};

use crate::{core::Container, domain::ModuleName, treewalk::types::Module};

thread_local! {
    static SHARED: ModuleRegistry = ModuleRegistry::new();
}

/// The table of loaded modules, keyed by dotted name. A module is registered before its body
/// runs, so a module that imports itself (directly or through a cycle) sees the partially
/// initialized entry instead of loading a second copy. Entries are never evicted.
///
/// Entries hold strong references, as `sys.modules` does: a registered module stays alive for as
/// long as any handle on its registry does, even after every loader and wrapper that used it is
/// dropped.
#[derive(Clone)]
pub struct ModuleRegistry {
    modules: Container<HashMap<ModuleName, Container<Module>>>,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleRegistry {
    /// An empty registry, isolated from every other.
    pub fn new() -> Self {
        Self {
            modules: Container::new(HashMap::new()),
        }
    }

    /// The registry shared by every loader on this thread that was not given its own.
    pub fn shared() -> Self {
        SHARED.with(|registry| registry.clone())
    }

    pub fn get(&self, name: &ModuleName) -> Option<Container<Module>> {
        self.modules.borrow().get(name).cloned()
    }

    pub fn insert(&self, module: Container<Module>) {
        let name = module.borrow().name().clone();
        self.modules.borrow_mut().insert(name, module);
    }

    pub fn contains(&self, name: &ModuleName) -> bool {
        self.modules.borrow().contains_key(name)
    }

    /// Every registered name, sorted.
    pub fn names(&self) -> Vec<ModuleName> {
        let mut names: Vec<_> = self.modules.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.modules.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.borrow().is_empty()
    }

    /// Whether both handles refer to the same underlying table.
    pub fn same_registry(&self, other: &ModuleRegistry) -> bool {
        self.modules.same_identity(&other.modules)
    }
}

impl Debug for ModuleRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::ModuleOrigin;

    fn module(name: &str) -> Container<Module> {
        Container::new(Module::new(
            ModuleName::from_dotted(name).unwrap(),
            None,
            ModuleOrigin::Synthetic,
        ))
    }

    #[test]
    fn insert_and_get() {
        let registry = ModuleRegistry::new();
        let tool = module("tool");
        registry.insert(tool.clone());

        let name = ModuleName::from_dotted("tool").unwrap();
        assert!(registry.contains(&name));
        assert!(registry.get(&name).unwrap().same_identity(&tool));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn entries_outlive_their_loaders() {
        let registry = ModuleRegistry::new();
        let weak = {
            let tool = module("tool");
            registry.insert(tool.clone());
            tool.downgrade()
        };

        assert!(weak.upgrade().is_some());
        let name = ModuleName::from_dotted("tool").unwrap();
        assert!(registry.get(&name).is_some());

        drop(registry);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn isolated_and_shared() {
        let first = ModuleRegistry::new();
        let second = ModuleRegistry::new();
        first.insert(module("only_in_first"));
        assert!(second.is_empty());
        assert!(!first.same_registry(&second));
        assert!(ModuleRegistry::shared().same_registry(&ModuleRegistry::shared()));
    }
}
