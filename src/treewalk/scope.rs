use std::collections::{HashMap, HashSet};

use crate::treewalk::TreewalkValue;

/// The symbol table of a module, class body, or function call. Names iterate in the order they
/// were first bound.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Scope {
    order: Vec<String>,
    symbol_table: HashMap<String, TreewalkValue>,

    /// Used to hold directives such as `global x` which will expire with this scope.
    global_vars: HashSet<String>,

    /// Used to hold directives such as `nonlocal x` which will expire with this scope.
    nonlocal_vars: HashSet<String>,
}

impl Scope {
    pub fn from_bindings<I>(bindings: I) -> Self
    where
        I: IntoIterator<Item = (String, TreewalkValue)>,
    {
        let mut scope = Self::default();
        for (name, value) in bindings {
            scope.insert(&name, value);
        }
        scope
    }

    pub fn get(&self, name: &str) -> Option<TreewalkValue> {
        self.symbol_table.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbol_table.contains_key(name)
    }

    /// Return a list of all the symbols available in this `Scope`.
    pub fn symbols(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn delete(&mut self, name: &str) -> Option<TreewalkValue> {
        let removed = self.symbol_table.remove(name)?;
        self.order.retain(|n| n != name);
        Some(removed)
    }

    /// Insert an `TreewalkValue` to this `Scope`. The `Scope` is returned to allow calls to be
    /// chained.
    pub fn insert(&mut self, name: &str, value: TreewalkValue) -> &mut Self {
        if self
            .symbol_table
            .insert(name.to_string(), value)
            .is_none()
        {
            self.order.push(name.to_string());
        }
        self
    }

    /// Given a variable `var`, indicate that `var` should refer to the variable in the
    /// global/module scope (which does not live in this struct) for the duration of _this_
    /// local scope.
    pub fn mark_global(&mut self, name: &str) {
        self.global_vars.insert(name.to_string());
    }

    /// Given a variable `var`, indicate that `var` should refer to the variable in the
    /// enclosing scope (which does not live in this struct) for the duration of _this_
    /// local scope.
    pub fn mark_nonlocal(&mut self, name: &str) {
        self.nonlocal_vars.insert(name.to_string());
    }

    pub fn has_global(&self, name: &str) -> bool {
        self.global_vars.contains(name)
    }

    pub fn has_nonlocal(&self, name: &str) -> bool {
        self.nonlocal_vars.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TreewalkValue)> {
        self.order
            .iter()
            .filter_map(|name| self.symbol_table.get_key_value(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let mut scope = Scope::default();
        scope
            .insert("b", TreewalkValue::Int(1))
            .insert("a", TreewalkValue::Int(2))
            .insert("b", TreewalkValue::Int(3));

        assert_eq!(scope.symbols(), vec!["b", "a"]);
        assert_eq!(scope.get("b"), Some(TreewalkValue::Int(3)));

        scope.delete("b");
        assert_eq!(scope.symbols(), vec!["a"]);
        assert!(!scope.contains("b"));
    }

    #[test]
    fn directives_are_tracked() {
        let mut scope = Scope::default();
        scope.mark_global("counter");
        scope.mark_nonlocal("total");
        assert!(scope.has_global("counter"));
        assert!(!scope.has_global("total"));
        assert!(scope.has_nonlocal("total"));
    }
}
