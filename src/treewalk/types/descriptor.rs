use crate::{
    core::Container,
    treewalk::{types::Class, TreewalkValue},
};

/// `@staticmethod`: the wrapped callable is returned unbound from both classes and instances.
#[derive(Debug, PartialEq, Clone)]
pub struct Staticmethod {
    pub func: Box<TreewalkValue>,
}

/// `@classmethod`: the wrapped callable is bound to the class.
#[derive(Debug, PartialEq, Clone)]
pub struct Classmethod {
    pub func: Box<TreewalkValue>,
}

/// `@property`, with an optional setter added through `@name.setter`.
#[derive(Debug, PartialEq, Clone)]
pub struct Property {
    pub fget: Box<TreewalkValue>,
    pub fset: Option<Box<TreewalkValue>>,
}

impl Property {
    pub fn new(fget: TreewalkValue) -> Self {
        Self {
            fget: Box::new(fget),
            fset: None,
        }
    }

    pub fn with_setter(&self, fset: TreewalkValue) -> Self {
        Self {
            fget: self.fget.clone(),
            fset: Some(Box::new(fset)),
        }
    }
}

/// A `super()` proxy: attribute lookups start after `class` in the receiver's MRO.
#[derive(Debug, PartialEq, Clone)]
pub struct Super {
    pub class: Container<Class>,
    pub receiver: Box<TreewalkValue>,
}
