use crate::{
    core::Container,
    treewalk::{Scope, TreewalkValue},
};

/// The chain of enclosing function scopes a closure captured, innermost first.
#[derive(Debug, PartialEq, Clone)]
pub struct EnvironmentFrame {
    scope: Container<Scope>,
    parent: Option<Container<EnvironmentFrame>>,
}

impl EnvironmentFrame {
    pub fn new(scope: Container<Scope>, parent: Option<Container<EnvironmentFrame>>) -> Self {
        Self { scope, parent }
    }

    /// Read a variable from the nearest enclosing scope that binds it.
    pub fn read(&self, name: &str) -> Option<TreewalkValue> {
        self.scope.borrow().get(name).or_else(|| {
            self.parent
                .as_ref()
                .and_then(|parent| parent.borrow().read(name))
        })
    }

    /// Rebind a variable in the nearest enclosing scope that binds it. Returns `false` when no
    /// enclosing scope does.
    pub fn write(&self, name: &str, value: TreewalkValue) -> bool {
        if self.scope.borrow().contains(name) {
            self.scope.borrow_mut().insert(name, value);
            return true;
        }
        match &self.parent {
            Some(parent) => parent.borrow().write(name, value),
            None => false,
        }
    }

    pub fn binds(&self, name: &str) -> bool {
        self.read(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_lookup_and_write() {
        let outer = Container::new(Scope::from_bindings([(
            "total".to_string(),
            TreewalkValue::Int(1),
        )]));
        let inner = Container::new(Scope::default());
        let outer_frame = Container::new(EnvironmentFrame::new(outer.clone(), None));
        let frame = EnvironmentFrame::new(inner, Some(outer_frame));

        assert_eq!(frame.read("total"), Some(TreewalkValue::Int(1)));
        assert!(frame.write("total", TreewalkValue::Int(5)));
        assert_eq!(outer.borrow().get("total"), Some(TreewalkValue::Int(5)));
        assert!(!frame.write("missing", TreewalkValue::None));
        assert!(!frame.binds("missing"));
    }
}
