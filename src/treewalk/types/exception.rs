use std::fmt::{Display, Error, Formatter};

use crate::{
    core::Container,
    domain::Type,
    treewalk::{types::Object, TreewalkValue},
};

/// A Python exception. Errors raised by the interpreter itself start out as a kind plus payload;
/// exceptions raised from Python code also carry the instance that was raised, so user-defined
/// exception classes and attributes survive being caught.
#[derive(Debug, PartialEq, Clone)]
pub struct Exception {
    pub kind: Type,
    pub payload: Vec<TreewalkValue>,
    pub instance: Option<Container<Object>>,
}

impl Exception {
    pub fn new(kind: Type, payload: Vec<TreewalkValue>) -> Self {
        Self {
            kind,
            payload,
            instance: None,
        }
    }

    /// Wrap a raised instance. `kind` is the nearest builtin exception class in its MRO.
    pub fn from_instance(kind: Type, payload: Vec<TreewalkValue>, instance: Container<Object>) -> Self {
        Self {
            kind,
            payload,
            instance: Some(instance),
        }
    }

    fn new_from_str(kind: Type, msg: impl Into<String>) -> Self {
        Self::new(kind, vec![TreewalkValue::Str(msg.into())])
    }

    fn new_empty(kind: Type) -> Self {
        Self::new(kind, vec![])
    }

    pub fn get_type(&self) -> Type {
        self.kind
    }

    /// The class name as Python would print it, which for user-defined exceptions is the
    /// subclass and not the builtin it derives from.
    pub fn class_name(&self) -> String {
        match &self.instance {
            Some(instance) => instance.borrow().class().borrow().name().to_string(),
            None => self.kind.name().to_string(),
        }
    }

    /// The text Python prints after the class name.
    pub fn message(&self) -> String {
        match self.payload.as_slice() {
            [] => String::new(),
            [single] if self.kind == Type::KeyError => single.repr(),
            [single] => single.to_string(),
            many => TreewalkValue::Tuple(many.to_vec().into()).repr(),
        }
    }

    pub fn runtime_error(msg: impl Into<String>) -> Self {
        Self::new_from_str(Type::RuntimeError, msg)
    }

    pub fn recursion_error() -> Self {
        Self::new_from_str(Type::RecursionError, "maximum recursion depth exceeded")
    }

    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::new_from_str(Type::TypeError, msg)
    }

    pub fn type_error_must_inherit_base_exception() -> Self {
        Self::type_error("catching classes that do not inherit from BaseException is not allowed")
    }

    pub fn type_error_not_callable(type_name: &str) -> Self {
        Self::type_error(format!("'{type_name}' object is not callable"))
    }

    pub fn type_error_not_iterable(type_name: &str) -> Self {
        Self::type_error(format!("'{type_name}' object is not iterable"))
    }

    pub fn type_error_unhashable(type_name: &str) -> Self {
        Self::type_error(format!("unhashable type: '{type_name}'"))
    }

    pub fn import_error(msg: impl Into<String>) -> Self {
        Self::new_from_str(Type::ImportError, msg)
    }

    pub fn module_not_found_error(name: impl Display) -> Self {
        Self::new_from_str(Type::ModuleNotFoundError, format!("No module named '{name}'"))
    }

    pub fn syntax_error(msg: impl Into<String>) -> Self {
        Self::new_from_str(Type::SyntaxError, msg)
    }

    pub fn stop_iteration() -> Self {
        Self::new_empty(Type::StopIteration)
    }

    pub fn value_error(msg: impl Into<String>) -> Self {
        Self::new_from_str(Type::ValueError, msg)
    }

    pub fn name_error(name: impl Display) -> Self {
        Self::new_from_str(Type::NameError, format!("name '{name}' is not defined"))
    }

    pub fn key_error(key: TreewalkValue) -> Self {
        Self::new(Type::KeyError, vec![key])
    }

    pub fn index_error(msg: impl Into<String>) -> Self {
        Self::new_from_str(Type::IndexError, msg)
    }

    pub fn attribute_error(msg: impl Into<String>) -> Self {
        Self::new_from_str(Type::AttributeError, msg)
    }

    pub fn zero_division_error(msg: impl Into<String>) -> Self {
        Self::new_from_str(Type::ZeroDivisionError, msg)
    }

    pub fn overflow_error(msg: impl Into<String>) -> Self {
        Self::new_from_str(Type::OverflowError, msg)
    }

    pub fn assertion_error(message: Option<TreewalkValue>) -> Self {
        Self::new(Type::AssertionError, message.into_iter().collect())
    }

    pub fn not_implemented_error(msg: impl Into<String>) -> Self {
        Self::new_from_str(Type::NotImplementedError, msg)
    }

    pub fn os_error(msg: impl Into<String>) -> Self {
        Self::new_from_str(Type::OSError, msg)
    }
}

impl Display for Exception {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let message = self.message();
        if message.is_empty() {
            write!(f, "{}", self.class_name())
        } else {
            write!(f, "{}: {}", self.class_name(), message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            Exception::name_error("foo").to_string(),
            "NameError: name 'foo' is not defined"
        );
        assert_eq!(
            Exception::key_error(TreewalkValue::Str("k".into())).to_string(),
            "KeyError: 'k'"
        );
        assert_eq!(Exception::stop_iteration().to_string(), "StopIteration");
        assert_eq!(
            Exception::new(
                Type::ValueError,
                vec![TreewalkValue::Int(1), TreewalkValue::Str("a".into())]
            )
            .message(),
            "(1, 'a')"
        );
    }
}
