use std::fmt::{Display, Error, Formatter};

/// The builtin classes the interpreter provides. Each variant backs exactly one class object per
/// interpreter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Object,
    Type,
    None,
    Bool,
    Int,
    Float,
    Str,
    List,
    Tuple,
    Dict,
    Bytes,
    Range,
    Slice,
    Ellipsis,
    Property,
    Function,
    BuiltinFunction,
    Method,
    Module,
    Staticmethod,
    Classmethod,
    Super,
    GenericAlias,
    Union,
    SpecialForm,
    BaseException,
    Exception,
    ArithmeticError,
    ZeroDivisionError,
    OverflowError,
    LookupError,
    KeyError,
    IndexError,
    AttributeError,
    NameError,
    ImportError,
    ModuleNotFoundError,
    TypeError,
    ValueError,
    RuntimeError,
    NotImplementedError,
    RecursionError,
    SyntaxError,
    AssertionError,
    StopIteration,
    OSError,
}

impl Type {
    /// Every builtin, in the order they are created. Parents come before children.
    pub const ALL: [Type; 46] = [
        Type::Object,
        Type::Type,
        Type::None,
        Type::Int,
        Type::Bool,
        Type::Float,
        Type::Str,
        Type::List,
        Type::Tuple,
        Type::Dict,
        Type::Bytes,
        Type::Range,
        Type::Slice,
        Type::Ellipsis,
        Type::Property,
        Type::Function,
        Type::BuiltinFunction,
        Type::Method,
        Type::Module,
        Type::Staticmethod,
        Type::Classmethod,
        Type::Super,
        Type::GenericAlias,
        Type::Union,
        Type::SpecialForm,
        Type::BaseException,
        Type::Exception,
        Type::ArithmeticError,
        Type::ZeroDivisionError,
        Type::OverflowError,
        Type::LookupError,
        Type::KeyError,
        Type::IndexError,
        Type::AttributeError,
        Type::NameError,
        Type::ImportError,
        Type::ModuleNotFoundError,
        Type::TypeError,
        Type::ValueError,
        Type::RuntimeError,
        Type::NotImplementedError,
        Type::RecursionError,
        Type::SyntaxError,
        Type::AssertionError,
        Type::StopIteration,
        Type::OSError,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Type::Object => "object",
            Type::Type => "type",
            Type::None => "NoneType",
            Type::Bool => "bool",
            Type::Int => "int",
            Type::Float => "float",
            Type::Str => "str",
            Type::List => "list",
            Type::Tuple => "tuple",
            Type::Dict => "dict",
            Type::Bytes => "bytes",
            Type::Range => "range",
            Type::Slice => "slice",
            Type::Ellipsis => "ellipsis",
            Type::Property => "property",
            Type::Function => "function",
            Type::BuiltinFunction => "builtin_function_or_method",
            Type::Method => "method",
            Type::Module => "module",
            Type::Staticmethod => "staticmethod",
            Type::Classmethod => "classmethod",
            Type::Super => "super",
            Type::GenericAlias => "GenericAlias",
            Type::Union => "UnionType",
            Type::SpecialForm => "_SpecialForm",
            Type::BaseException => "BaseException",
            Type::Exception => "Exception",
            Type::ArithmeticError => "ArithmeticError",
            Type::ZeroDivisionError => "ZeroDivisionError",
            Type::OverflowError => "OverflowError",
            Type::LookupError => "LookupError",
            Type::KeyError => "KeyError",
            Type::IndexError => "IndexError",
            Type::AttributeError => "AttributeError",
            Type::NameError => "NameError",
            Type::ImportError => "ImportError",
            Type::ModuleNotFoundError => "ModuleNotFoundError",
            Type::TypeError => "TypeError",
            Type::ValueError => "ValueError",
            Type::RuntimeError => "RuntimeError",
            Type::NotImplementedError => "NotImplementedError",
            Type::RecursionError => "RecursionError",
            Type::SyntaxError => "SyntaxError",
            Type::AssertionError => "AssertionError",
            Type::StopIteration => "StopIteration",
            Type::OSError => "OSError",
        }
    }

    /// The single base class of this builtin, or `None` for `object`.
    pub fn parent(&self) -> Option<Type> {
        match self {
            Type::Object => None,
            Type::Bool => Some(Type::Int),
            Type::BaseException => Some(Type::Object),
            Type::Exception => Some(Type::BaseException),
            Type::ArithmeticError
            | Type::LookupError
            | Type::AttributeError
            | Type::NameError
            | Type::ImportError
            | Type::TypeError
            | Type::ValueError
            | Type::RuntimeError
            | Type::AssertionError
            | Type::SyntaxError
            | Type::StopIteration
            | Type::OSError => Some(Type::Exception),
            Type::ZeroDivisionError | Type::OverflowError => Some(Type::ArithmeticError),
            Type::KeyError | Type::IndexError => Some(Type::LookupError),
            Type::ModuleNotFoundError => Some(Type::ImportError),
            Type::NotImplementedError | Type::RecursionError => Some(Type::RuntimeError),
            _ => Some(Type::Object),
        }
    }

    /// Builtins exposed by name in the `builtins` namespace.
    pub fn is_exposed(&self) -> bool {
        matches!(
            self,
            Type::Object
                | Type::Type
                | Type::Bool
                | Type::Int
                | Type::Float
                | Type::Str
                | Type::List
                | Type::Tuple
                | Type::Dict
                | Type::Bytes
                | Type::Range
                | Type::Property
                | Type::Staticmethod
                | Type::Classmethod
                | Type::Super
        ) || self.is_exception()
    }

    pub fn is_exception(&self) -> bool {
        let mut current = Some(*self);
        while let Some(t) = current {
            if t == Type::BaseException {
                return true;
            }
            current = t.parent();
        }
        false
    }

    /// Whether user classes may list this builtin as a base.
    pub fn is_subclassable(&self) -> bool {
        matches!(self, Type::Object) || self.is_exception()
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_parent_is_created_first() {
        for (i, t) in Type::ALL.iter().enumerate() {
            if let Some(parent) = t.parent() {
                let parent_pos = Type::ALL.iter().position(|p| *p == parent).unwrap();
                assert!(parent_pos < i, "{t} is created before its parent {parent}");
            }
        }
    }

    #[test]
    fn exception_hierarchy() {
        assert!(Type::KeyError.is_exception());
        assert!(Type::BaseException.is_exception());
        assert!(!Type::Str.is_exception());
        assert_eq!(Type::ModuleNotFoundError.parent(), Some(Type::ImportError));
    }
}
