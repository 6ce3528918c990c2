use std::fmt::{Debug, Error, Formatter};

use crate::treewalk::{utils::Args, TreewalkInterpreter, TreewalkResult, TreewalkValue};

pub type BuiltinFn = fn(&TreewalkInterpreter, Args) -> TreewalkResult<TreewalkValue>;

/// A function implemented in Rust. Builtin methods receive their receiver as the first
/// positional argument.
#[derive(Clone)]
pub struct BuiltinFunction {
    name: &'static str,
    func: BuiltinFn,
}

impl BuiltinFunction {
    pub const fn new(name: &'static str, func: BuiltinFn) -> Self {
        Self { name, func }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn call(
        &self,
        interpreter: &TreewalkInterpreter,
        args: Args,
    ) -> TreewalkResult<TreewalkValue> {
        (self.func)(interpreter, args)
    }
}

impl PartialEq for BuiltinFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Debug for BuiltinFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "<built-in function {}>", self.name)
    }
}
