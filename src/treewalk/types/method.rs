use crate::treewalk::TreewalkValue;

/// A callable bound to a receiver, which is passed as the first argument.
#[derive(Debug, PartialEq, Clone)]
pub struct Method {
    receiver: TreewalkValue,
    function: TreewalkValue,
}

impl Method {
    pub fn new(receiver: TreewalkValue, function: TreewalkValue) -> Self {
        Self { receiver, function }
    }

    pub fn receiver(&self) -> &TreewalkValue {
        &self.receiver
    }

    pub fn function(&self) -> &TreewalkValue {
        &self.function
    }

    pub fn name(&self) -> String {
        match &self.function {
            TreewalkValue::Function(f) => f.borrow().name.clone(),
            TreewalkValue::BuiltinFunction(f) => f.name().to_string(),
            _ => String::from("?"),
        }
    }
}
