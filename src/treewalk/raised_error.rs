use std::fmt::{Display, Error, Formatter};

use crate::{domain::DebugCallStack, treewalk::types::Exception};

/// An exception in flight, together with the call stack at the point it was raised.
#[derive(Debug, PartialEq, Clone)]
pub struct RaisedException {
    pub debug_call_stack: DebugCallStack,
    pub exception: Exception,
}

impl RaisedException {
    pub fn new(debug_call_stack: DebugCallStack, exception: Exception) -> Self {
        Self {
            debug_call_stack,
            exception,
        }
    }

    /// The line the exception was raised from, if it was raised inside Python code.
    pub fn line(&self) -> Option<usize> {
        self.debug_call_stack.last().map(|f| f.line)
    }
}

impl Display for RaisedException {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}{}", self.debug_call_stack, self.exception)
    }
}

impl std::error::Error for RaisedException {}
