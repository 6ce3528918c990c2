use crate::{
    core::Container,
    treewalk::{
        types::{Function, Module},
        utils::EnvironmentFrame,
        Scope, TreewalkValue,
    },
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameKind {
    Module,
    Class,
    Function,
}

/// Where names resolve while a block executes.
#[derive(Clone)]
pub struct Frame {
    pub module: Container<Module>,
    pub kind: FrameKind,
    /// The function locals or class namespace. Module frames bind into the module directly.
    pub local: Option<Container<Scope>>,
    /// Enclosing function scopes visible to this frame.
    pub enclosing: Option<Container<EnvironmentFrame>>,
    /// The function being executed, for zero-argument `super()`.
    pub function: Option<Container<Function>>,
    /// Prefix for the `__qualname__` of definitions made in this frame.
    qualname: Option<String>,
}

impl Frame {
    pub fn module(module: Container<Module>) -> Self {
        Self {
            module,
            kind: FrameKind::Module,
            local: None,
            enclosing: None,
            function: None,
            qualname: None,
        }
    }

    pub fn function(function: &Container<Function>, local: Scope) -> Self {
        let f = function.borrow();
        Self {
            module: f.globals.clone(),
            kind: FrameKind::Function,
            local: Some(Container::new(local)),
            enclosing: f.closure.clone(),
            function: Some(function.clone()),
            qualname: Some(format!("{}.<locals>", f.qualname)),
        }
    }

    pub fn class_body(&self, namespace: Container<Scope>, qualname: &str) -> Self {
        Self {
            module: self.module.clone(),
            kind: FrameKind::Class,
            local: Some(namespace),
            enclosing: self.closure(),
            function: None,
            qualname: Some(qualname.to_string()),
        }
    }

    /// A comprehension runs in its own function-like scope nested in this one.
    pub fn comprehension(&self) -> Self {
        Self {
            module: self.module.clone(),
            kind: FrameKind::Function,
            local: Some(Container::new(Scope::default())),
            enclosing: self.closure(),
            function: self.function.clone(),
            qualname: self.qualname.clone(),
        }
    }

    /// The environment a function defined in this frame closes over. Class namespaces are not
    /// part of it.
    pub fn closure(&self) -> Option<Container<EnvironmentFrame>> {
        match (&self.kind, &self.local) {
            (FrameKind::Function, Some(local)) => Some(Container::new(EnvironmentFrame::new(
                local.clone(),
                self.enclosing.clone(),
            ))),
            _ => self.enclosing.clone(),
        }
    }

    pub fn qualify(&self, name: &str) -> String {
        match &self.qualname {
            Some(prefix) => format!("{prefix}.{name}"),
            None => name.to_string(),
        }
    }

    pub fn module_name(&self) -> String {
        self.module.borrow().name().as_str()
    }
}

/// How a statement finished.
#[derive(Debug, PartialEq)]
pub enum Flow {
    Next,
    Return(TreewalkValue),
    Break,
    Continue,
}
