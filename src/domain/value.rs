use std::{
    any::Any,
    fmt::{Debug, Display, Formatter, Result},
    rc::Rc,
};

use crate::domain::utils::comma_separated;

/// The value type exchanged between a host and plugin code: arguments passed into a plugin
/// callable and results returned from it. Plain data converts structurally; anything else (class
/// instances, functions, modules) crosses the boundary as an [`Opaque`] handle which can be passed
/// back into later calls unchanged.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    None,
    Integer(i64),
    Float(f64),
    Str(String),
    Boolean(bool),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Dict(Vec<(Value, Value)>),
    Opaque(Opaque),
}

impl Value {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Python-style literal rendering, used in error messages and signature reports.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("'{s}'"),
            Value::List(items) => format!("[{}]", comma_separated(items.iter().map(|i| i.repr()))),
            Value::Tuple(items) if items.len() == 1 => format!("({},)", items[0].repr()),
            Value::Tuple(items) => format!("({})", comma_separated(items.iter().map(|i| i.repr()))),
            Value::Dict(items) => format!(
                "{{{}}}",
                comma_separated(items.iter().map(|(k, v)| format!("{}: {}", k.repr(), v.repr())))
            ),
            _ => self.to_string(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(i) => write!(f, "{i:?}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Boolean(b) => match b {
                true => write!(f, "True"),
                false => write!(f, "False"),
            },
            Value::List(_) | Value::Tuple(_) | Value::Dict(_) => write!(f, "{}", self.repr()),
            Value::Opaque(o) => write!(f, "{}", o.repr()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

/// A handle on an interpreter object with no plain-data equivalent. Equality is identity.
#[derive(Clone)]
pub struct Opaque {
    type_name: String,
    repr: String,
    inner: Rc<dyn Any>,
}

impl Opaque {
    pub fn new<T: Any>(type_name: impl Into<String>, repr: impl Into<String>, inner: T) -> Self {
        Self {
            type_name: type_name.into(),
            repr: repr.into(),
            inner: Rc::new(inner),
        }
    }

    /// The Python class name of the wrapped object.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn repr(&self) -> &str {
        &self.repr
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Debug for Opaque {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "Opaque({})", self.repr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_python() {
        assert_eq!(Value::None.to_string(), "None");
        assert_eq!(Value::Boolean(true).to_string(), "True");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Float(3.0).to_string(), "3.0");
        assert_eq!(
            Value::List(vec!["a".into(), Value::Integer(1)]).to_string(),
            "['a', 1]"
        );
        assert_eq!(Value::Tuple(vec![Value::Integer(1)]).to_string(), "(1,)");
    }

    #[test]
    fn opaque_equality_is_identity() {
        let a = Opaque::new("Tool", "<Tool object>", 1_u8);
        let b = Opaque::new("Tool", "<Tool object>", 1_u8);

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.downcast_ref::<u8>(), Some(&1));
    }
}
