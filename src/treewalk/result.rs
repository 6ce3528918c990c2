use crate::treewalk::{types::Exception, RaisedException, TreewalkInterpreter};

/// Errors produced by code that has no access to the interpreter. They gain a traceback once
/// they are raised through [`Raise`].
pub type DomainResult<T> = Result<T, Exception>;

pub type TreewalkResult<T> = Result<T, RaisedException>;

pub trait Raise<T> {
    fn raise(self, interpreter: &TreewalkInterpreter) -> TreewalkResult<T>;
}

impl<T> Raise<T> for DomainResult<T> {
    fn raise(self, interpreter: &TreewalkInterpreter) -> TreewalkResult<T> {
        self.map_err(|e| interpreter.raise(e))
    }
}

impl<T> Raise<T> for Exception {
    fn raise(self, interpreter: &TreewalkInterpreter) -> TreewalkResult<T> {
        Err(interpreter.raise(self))
    }
}
