use std::{
    fmt::{Debug, Error, Formatter},
    ptr,
};

use crate::{
    core::Container,
    treewalk::{types::Class, Scope, TreewalkValue},
};

/// An instance of a user class, or of a builtin exception class.
#[derive(Clone)]
pub struct Object {
    class: Container<Class>,
    scope: Scope,
}

impl Debug for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "<{} object>", self.class.borrow().full_name())
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

impl Object {
    pub fn new(class: Container<Class>) -> Self {
        Self {
            class,
            scope: Scope::default(),
        }
    }

    pub fn class(&self) -> &Container<Class> {
        &self.class
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
