use std::{
    fmt::{Debug, Error, Formatter},
    ptr,
    rc::Rc,
};

use crate::{
    core::{Container, WeakContainer},
    parser::types::Ast,
    treewalk::{
        types::{Class, Module},
        utils::EnvironmentFrame,
        Scope, TreewalkValue,
    },
};

/// A parameter after its annotation and default have been evaluated at `def` time.
#[derive(Debug, PartialEq, Clone)]
pub struct FunctionParam {
    pub name: String,
    pub annotation: Option<TreewalkValue>,
    pub default: Option<TreewalkValue>,
}

impl FunctionParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
            default: None,
        }
    }
}

#[derive(Debug, Default, PartialEq, Clone)]
pub struct FunctionSignature {
    /// Positional-or-keyword parameters, with the positional-only ones first.
    pub params: Vec<FunctionParam>,
    pub positional_only: usize,
    pub args_var: Option<FunctionParam>,
    pub kwonly: Vec<FunctionParam>,
    pub kwargs_var: Option<FunctionParam>,
    pub returns: Option<TreewalkValue>,
}

impl FunctionSignature {
    /// Every parameter name in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .chain(self.args_var.iter())
            .chain(self.kwonly.iter())
            .chain(self.kwargs_var.iter())
            .map(|p| p.name.as_str())
    }
}

/// A function defined by `def` or `lambda`.
#[derive(Clone)]
pub struct Function {
    pub name: String,
    pub qualname: String,
    pub module: String,
    pub signature: FunctionSignature,
    pub body: Rc<Ast>,
    pub line: usize,
    pub globals: Container<Module>,
    pub closure: Option<Container<EnvironmentFrame>>,
    /// Set when the function is defined in a class body, for zero-argument `super()`.
    pub defining_class: Option<WeakContainer<Class>>,
    pub doc: Option<String>,
    /// Arbitrary attributes assigned onto the function object.
    pub attrs: Scope,
}

impl Debug for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "<function {}>", self.qualname)
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

impl Function {
    pub fn defining_class(&self) -> Option<Container<Class>> {
        self.defining_class.as_ref().and_then(|c| c.upgrade())
    }

    pub fn is_lambda(&self) -> bool {
        self.name == "<lambda>"
    }
}
