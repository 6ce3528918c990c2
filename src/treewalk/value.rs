use std::fmt::{Debug, Display, Error, Formatter};

use crate::{
    core::{floats_equal, Container},
    domain::{utils::bytes_repr, Dunder, ModuleOrigin, Opaque, Type, Value},
    treewalk::{
        types::{
            render_annotation, BuiltinFunction, Class, Classmethod, Dict, Exception, Function,
            GenericAlias, List, Method, Module, Object, Property, Range, Slice, SpecialForm,
            Staticmethod, Super, Tuple, UnionType,
        },
        utils::{format_float, repr_str},
        DomainResult,
    },
};

#[derive(Clone)]
pub enum TreewalkValue {
    None,
    Ellipsis,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Container<List>),
    Tuple(Tuple),
    Dict(Container<Dict>),
    Range(Range),
    Slice(Slice),
    Class(Container<Class>),
    Object(Container<Object>),
    Function(Container<Function>),
    Method(Container<Method>),
    BuiltinFunction(BuiltinFunction),
    Module(Container<Module>),
    Staticmethod(Staticmethod),
    Classmethod(Classmethod),
    Property(Property),
    Super(Super),
    GenericAlias(GenericAlias),
    Union(UnionType),
    SpecialForm(SpecialForm),
}

impl PartialEq for TreewalkValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TreewalkValue::None, TreewalkValue::None) => true,
            (TreewalkValue::Ellipsis, TreewalkValue::Ellipsis) => true,
            (TreewalkValue::Bool(a), TreewalkValue::Bool(b)) => a == b,
            (TreewalkValue::Int(a), TreewalkValue::Int(b)) => a == b,
            (TreewalkValue::Bool(a), TreewalkValue::Int(b))
            | (TreewalkValue::Int(b), TreewalkValue::Bool(a)) => *a as i64 == *b,
            (TreewalkValue::Float(a), TreewalkValue::Float(b)) => floats_equal(*a, *b),
            (TreewalkValue::Int(a), TreewalkValue::Float(b))
            | (TreewalkValue::Float(b), TreewalkValue::Int(a)) => floats_equal(*a as f64, *b),
            (TreewalkValue::Str(a), TreewalkValue::Str(b)) => a == b,
            (TreewalkValue::Bytes(a), TreewalkValue::Bytes(b)) => a == b,
            (TreewalkValue::List(a), TreewalkValue::List(b)) => a == b,
            (TreewalkValue::Tuple(a), TreewalkValue::Tuple(b)) => a == b,
            (TreewalkValue::Dict(a), TreewalkValue::Dict(b)) => a == b,
            (TreewalkValue::Range(a), TreewalkValue::Range(b)) => a == b,
            (TreewalkValue::Slice(a), TreewalkValue::Slice(b)) => a == b,
            (TreewalkValue::Class(a), TreewalkValue::Class(b)) => a.same_identity(b),
            (TreewalkValue::Object(a), TreewalkValue::Object(b)) => a.same_identity(b),
            (TreewalkValue::Function(a), TreewalkValue::Function(b)) => a.same_identity(b),
            (TreewalkValue::Method(a), TreewalkValue::Method(b)) => a == b,
            (TreewalkValue::BuiltinFunction(a), TreewalkValue::BuiltinFunction(b)) => a == b,
            (TreewalkValue::Module(a), TreewalkValue::Module(b)) => a.same_identity(b),
            (TreewalkValue::Staticmethod(a), TreewalkValue::Staticmethod(b)) => a == b,
            (TreewalkValue::Classmethod(a), TreewalkValue::Classmethod(b)) => a == b,
            (TreewalkValue::Property(a), TreewalkValue::Property(b)) => a == b,
            (TreewalkValue::Super(a), TreewalkValue::Super(b)) => a == b,
            (TreewalkValue::GenericAlias(a), TreewalkValue::GenericAlias(b)) => a == b,
            (TreewalkValue::Union(a), TreewalkValue::Union(b)) => a == b,
            (TreewalkValue::SpecialForm(a), TreewalkValue::SpecialForm(b)) => a == b,
            _ => false,
        }
    }
}

impl TreewalkValue {
    pub fn new_list(items: Vec<TreewalkValue>) -> Self {
        TreewalkValue::List(Container::new(List::new(items)))
    }

    pub fn new_tuple(items: Vec<TreewalkValue>) -> Self {
        TreewalkValue::Tuple(Tuple::new(items))
    }

    pub fn new_dict(dict: Dict) -> Self {
        TreewalkValue::Dict(Container::new(dict))
    }

    pub fn new_method(receiver: TreewalkValue, function: TreewalkValue) -> Self {
        TreewalkValue::Method(Container::new(Method::new(receiver, function)))
    }

    pub fn str(value: impl Into<String>) -> Self {
        TreewalkValue::Str(value.into())
    }

    /// The builtin type backing this value. Instances of user classes report `object`; use the
    /// interpreter to get their actual class.
    pub fn get_type(&self) -> Type {
        match self {
            TreewalkValue::None => Type::None,
            TreewalkValue::Ellipsis => Type::Ellipsis,
            TreewalkValue::Bool(_) => Type::Bool,
            TreewalkValue::Int(_) => Type::Int,
            TreewalkValue::Float(_) => Type::Float,
            TreewalkValue::Str(_) => Type::Str,
            TreewalkValue::Bytes(_) => Type::Bytes,
            TreewalkValue::List(_) => Type::List,
            TreewalkValue::Tuple(_) => Type::Tuple,
            TreewalkValue::Dict(_) => Type::Dict,
            TreewalkValue::Range(_) => Type::Range,
            TreewalkValue::Slice(_) => Type::Slice,
            TreewalkValue::Class(_) => Type::Type,
            TreewalkValue::Object(_) => Type::Object,
            TreewalkValue::Function(_) => Type::Function,
            TreewalkValue::Method(_) => Type::Method,
            TreewalkValue::BuiltinFunction(_) => Type::BuiltinFunction,
            TreewalkValue::Module(_) => Type::Module,
            TreewalkValue::Staticmethod(_) => Type::Staticmethod,
            TreewalkValue::Classmethod(_) => Type::Classmethod,
            TreewalkValue::Property(_) => Type::Property,
            TreewalkValue::Super(_) => Type::Super,
            TreewalkValue::GenericAlias(_) => Type::GenericAlias,
            TreewalkValue::Union(_) => Type::Union,
            TreewalkValue::SpecialForm(_) => Type::SpecialForm,
        }
    }

    /// The Python class name of this value, as used in error messages.
    pub fn type_name(&self) -> String {
        match self {
            TreewalkValue::Object(object) => object.borrow().class().borrow().name().to_string(),
            _ => self.get_type().name().to_string(),
        }
    }

    /// Identity for values that have it, as in Python's `id()`. Plain data reports zero.
    pub fn identity(&self) -> usize {
        match self {
            TreewalkValue::List(c) => c.address(),
            TreewalkValue::Dict(c) => c.address(),
            TreewalkValue::Class(c) => c.address(),
            TreewalkValue::Object(c) => c.address(),
            TreewalkValue::Function(c) => c.address(),
            TreewalkValue::Method(c) => c.address(),
            TreewalkValue::Module(c) => c.address(),
            TreewalkValue::BuiltinFunction(f) => f.name().as_ptr() as usize,
            _ => 0,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, TreewalkValue::None)
    }

    pub fn is_callable(&self) -> bool {
        match self {
            TreewalkValue::Function(_)
            | TreewalkValue::Method(_)
            | TreewalkValue::BuiltinFunction(_)
            | TreewalkValue::Class(_) => true,
            TreewalkValue::Object(object) => object.borrow().class().lookup(&Dunder::Call).is_some(),
            _ => false,
        }
    }

    pub fn as_int(&self) -> DomainResult<i64> {
        match self {
            TreewalkValue::Int(i) => Ok(*i),
            TreewalkValue::Bool(b) => Ok(*b as i64),
            _ => Err(Exception::type_error(format!(
                "'{}' object cannot be interpreted as an integer",
                self.type_name()
            ))),
        }
    }

    pub fn as_float(&self) -> DomainResult<f64> {
        match self {
            TreewalkValue::Float(f) => Ok(*f),
            TreewalkValue::Int(i) => Ok(*i as f64),
            TreewalkValue::Bool(b) => Ok(*b as i64 as f64),
            _ => Err(Exception::type_error(format!(
                "must be real number, not {}",
                self.type_name()
            ))),
        }
    }

    pub fn as_str(&self) -> DomainResult<String> {
        match self {
            TreewalkValue::Str(s) => Ok(s.clone()),
            _ => Err(Exception::type_error(format!(
                "expected str, got {}",
                self.type_name()
            ))),
        }
    }

    pub fn as_class(&self) -> Option<Container<Class>> {
        match self {
            TreewalkValue::Class(class) => Some(class.clone()),
            _ => None,
        }
    }

    /// `repr()` for values that do not need the interpreter: user `__repr__` methods are not
    /// consulted.
    pub fn repr(&self) -> String {
        self.repr_within(&mut vec![])
    }

    /// `seen` holds the lists and dicts being rendered further up; meeting one again prints
    /// `[...]` or `{...}`.
    fn repr_within(&self, seen: &mut Vec<usize>) -> String {
        match self {
            TreewalkValue::None => "None".into(),
            TreewalkValue::Ellipsis => "Ellipsis".into(),
            TreewalkValue::Bool(true) => "True".into(),
            TreewalkValue::Bool(false) => "False".into(),
            TreewalkValue::Int(i) => i.to_string(),
            TreewalkValue::Float(f) => format_float(*f),
            TreewalkValue::Str(s) => repr_str(s),
            TreewalkValue::Bytes(b) => bytes_repr(b),
            TreewalkValue::List(list) => {
                if seen.contains(&list.address()) {
                    return "[...]".into();
                }
                seen.push(list.address());
                let repr = format!("[{}]", join_repr(list.borrow().iter(), seen));
                seen.pop();
                repr
            }
            TreewalkValue::Tuple(tuple) if tuple.len() == 1 => {
                format!("({},)", join_repr(tuple.iter(), seen))
            }
            TreewalkValue::Tuple(tuple) => format!("({})", join_repr(tuple.iter(), seen)),
            TreewalkValue::Dict(dict) => {
                if seen.contains(&dict.address()) {
                    return "{...}".into();
                }
                seen.push(dict.address());
                let parts = dict
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.repr_within(seen), v.repr_within(seen)))
                    .collect::<Vec<_>>();
                seen.pop();
                format!("{{{}}}", parts.join(", "))
            }
            TreewalkValue::Range(r) if r.step == 1 => format!("range({}, {})", r.start, r.stop),
            TreewalkValue::Range(r) => format!("range({}, {}, {})", r.start, r.stop, r.step),
            TreewalkValue::Slice(s) => {
                let part = |p: Option<i64>| p.map_or("None".to_string(), |i| i.to_string());
                format!(
                    "slice({}, {}, {})",
                    part(s.start),
                    part(s.stop),
                    part(s.step)
                )
            }
            TreewalkValue::Class(class) => format!("<class '{}'>", class.borrow().full_name()),
            TreewalkValue::Object(object) => {
                let object = object.borrow();
                let class = object.class();
                if class.is_exception() {
                    let args = match object.get("args") {
                        Some(TreewalkValue::Tuple(args)) => join_repr(args.iter(), seen),
                        _ => String::new(),
                    };
                    format!("{}({})", class.borrow().name(), args)
                } else {
                    format!(
                        "<{} object at {:#x}>",
                        class.borrow().full_name(),
                        self.identity()
                    )
                }
            }
            TreewalkValue::Function(f) => {
                format!("<function {} at {:#x}>", f.borrow().qualname, self.identity())
            }
            TreewalkValue::Method(m) => format!("<bound method {}>", m.borrow().name()),
            TreewalkValue::BuiltinFunction(f) => format!("<built-in function {}>", f.name()),
            TreewalkValue::Module(module) => {
                let module = module.borrow();
                match module.origin() {
                    ModuleOrigin::File(path) => {
                        format!("<module '{}' from '{}'>", module.name(), path.display())
                    }
                    ModuleOrigin::Builtin => format!("<module '{}' (built-in)>", module.name()),
                    _ => format!("<module '{}'>", module.name()),
                }
            }
            TreewalkValue::Staticmethod(_) => "<staticmethod object>".into(),
            TreewalkValue::Classmethod(_) => "<classmethod object>".into(),
            TreewalkValue::Property(_) => "<property object>".into(),
            TreewalkValue::Super(s) => format!("<super: <class '{}'>>", s.class.borrow().name()),
            TreewalkValue::GenericAlias(_)
            | TreewalkValue::Union(_)
            | TreewalkValue::SpecialForm(_) => render_annotation(self),
        }
    }
}

fn join_repr<'a>(
    items: impl Iterator<Item = &'a TreewalkValue>,
    seen: &mut Vec<usize>,
) -> String {
    items
        .map(|i| i.repr_within(seen))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `str()` for values that do not need the interpreter.
impl Display for TreewalkValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            TreewalkValue::Str(s) => write!(f, "{s}"),
            TreewalkValue::Object(object) if object.borrow().class().is_exception() => {
                let args = match object.borrow().get("args") {
                    Some(TreewalkValue::Tuple(args)) => args.to_vec(),
                    _ => vec![],
                };
                match args.as_slice() {
                    [] => Ok(()),
                    [single] => write!(f, "{single}"),
                    _ => write!(f, "{}", TreewalkValue::new_tuple(args).repr()),
                }
            }
            _ => write!(f, "{}", self.repr()),
        }
    }
}

impl Debug for TreewalkValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", self.repr())
    }
}

impl From<bool> for TreewalkValue {
    fn from(value: bool) -> Self {
        TreewalkValue::Bool(value)
    }
}

impl From<i64> for TreewalkValue {
    fn from(value: i64) -> Self {
        TreewalkValue::Int(value)
    }
}

impl From<f64> for TreewalkValue {
    fn from(value: f64) -> Self {
        TreewalkValue::Float(value)
    }
}

impl From<&str> for TreewalkValue {
    fn from(value: &str) -> Self {
        TreewalkValue::Str(value.to_string())
    }
}

impl From<String> for TreewalkValue {
    fn from(value: String) -> Self {
        TreewalkValue::Str(value)
    }
}

/// Plain data converts structurally; everything else becomes an [`Opaque`] handle holding the
/// original value. A list or dict met again inside itself is handed over as a handle.
impl From<TreewalkValue> for Value {
    fn from(value: TreewalkValue) -> Self {
        to_value(value, &mut vec![])
    }
}

fn to_value(value: TreewalkValue, seen: &mut Vec<usize>) -> Value {
    let address = match &value {
        TreewalkValue::List(list) => Some(list.address()),
        TreewalkValue::Dict(dict) => Some(dict.address()),
        _ => None,
    };
    if address.is_some_and(|a| seen.contains(&a)) {
        return Value::Opaque(Opaque::new(value.type_name(), value.repr(), value));
    }
    seen.extend(address);

    let converted = match value {
        TreewalkValue::None => Value::None,
        TreewalkValue::Bool(b) => Value::Boolean(b),
        TreewalkValue::Int(i) => Value::Integer(i),
        TreewalkValue::Float(f) => Value::Float(f),
        TreewalkValue::Str(s) => Value::Str(s),
        TreewalkValue::List(list) => {
            let items = list.borrow().to_vec();
            Value::List(items.into_iter().map(|i| to_value(i, seen)).collect())
        }
        TreewalkValue::Tuple(tuple) => Value::Tuple(
            tuple
                .iter()
                .cloned()
                .map(|i| to_value(i, seen))
                .collect(),
        ),
        TreewalkValue::Dict(dict) => {
            let items = dict.borrow().items();
            Value::Dict(
                items
                    .into_iter()
                    .map(|(k, v)| (to_value(k, seen), to_value(v, seen)))
                    .collect(),
            )
        }
        other => Value::Opaque(Opaque::new(other.type_name(), other.repr(), other)),
    };

    if address.is_some() {
        seen.pop();
    }
    converted
}

impl TryFrom<Value> for TreewalkValue {
    type Error = Exception;

    /// Fails for dict keys that are unhashable, or for an opaque handle that did not come from
    /// this interpreter.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let converted = match value {
            Value::None => TreewalkValue::None,
            Value::Boolean(b) => TreewalkValue::Bool(b),
            Value::Integer(i) => TreewalkValue::Int(i),
            Value::Float(f) => TreewalkValue::Float(f),
            Value::Str(s) => TreewalkValue::Str(s),
            Value::List(items) => TreewalkValue::new_list(
                items
                    .into_iter()
                    .map(TryInto::try_into)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Tuple(items) => TreewalkValue::new_tuple(
                items
                    .into_iter()
                    .map(TryInto::try_into)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Dict(items) => {
                let mut dict = Dict::default();
                for (key, value) in items {
                    dict.insert(key.try_into()?, value.try_into()?)?;
                }
                TreewalkValue::new_dict(dict)
            }
            Value::Opaque(handle) => match handle.downcast_ref::<TreewalkValue>() {
                Some(inner) => inner.clone(),
                None => {
                    return Err(Exception::type_error(format!(
                        "cannot pass a foreign '{}' handle to plugin code",
                        handle.type_name()
                    )))
                }
            },
        };
        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repr_of_plain_data() {
        let value = TreewalkValue::new_list(vec![
            TreewalkValue::Int(1),
            TreewalkValue::Float(2.5),
            TreewalkValue::str("it's"),
            TreewalkValue::new_tuple(vec![TreewalkValue::None]),
        ]);
        assert_eq!(value.repr(), "[1, 2.5, \"it's\", (None,)]");
        assert_eq!(TreewalkValue::Float(3.0).repr(), "3.0");
        assert_eq!(TreewalkValue::str("a\nb").to_string(), "a\nb");
        assert_eq!(TreewalkValue::str("a\nb").repr(), "'a\\nb'");
    }

    #[test]
    fn self_containing_values() {
        let list = TreewalkValue::new_list(vec![TreewalkValue::Int(1)]);
        let TreewalkValue::List(inner) = &list else {
            unreachable!()
        };
        inner.borrow_mut().append(list.clone());
        assert_eq!(list.repr(), "[1, [...]]");

        let dict = TreewalkValue::new_dict(Dict::default());
        let TreewalkValue::Dict(inner) = &dict else {
            unreachable!()
        };
        inner
            .borrow_mut()
            .insert(TreewalkValue::str("self"), dict.clone())
            .unwrap();
        assert_eq!(dict.repr(), "{'self': {...}}");

        let Value::List(items) = Value::from(list) else {
            panic!("expected a list");
        };
        assert_eq!(items[0], Value::Integer(1));
        assert!(matches!(&items[1], Value::Opaque(handle) if handle.type_name() == "list"));
    }

    #[test]
    fn numeric_equality() {
        assert_eq!(TreewalkValue::Int(1), TreewalkValue::Float(1.0));
        assert_eq!(TreewalkValue::Bool(true), TreewalkValue::Int(1));
        assert_ne!(TreewalkValue::Int(1), TreewalkValue::str("1"));
    }

    #[test]
    fn conversions() {
        assert_eq!(TreewalkValue::Bool(true).as_int().unwrap(), 1);
        let e = TreewalkValue::str("x").as_int().unwrap_err();
        assert_eq!(
            e.message(),
            "'str' object cannot be interpreted as an integer"
        );
        assert_eq!(TreewalkValue::Int(2).as_float().unwrap(), 2.0);
    }

    #[test]
    fn host_values() {
        let value = TreewalkValue::new_tuple(vec![
            TreewalkValue::str("a"),
            TreewalkValue::new_list(vec![TreewalkValue::Int(1), TreewalkValue::None]),
        ]);
        let host: Value = value.clone().into();
        assert_eq!(
            host,
            Value::Tuple(vec!["a".into(), Value::List(vec![Value::Integer(1), Value::None])])
        );
        assert_eq!(TreewalkValue::try_from(host).unwrap(), value);

        let dict_key = Value::Dict(vec![(Value::List(vec![]), Value::None)]);
        assert!(TreewalkValue::try_from(dict_key).is_err());

        let function = TreewalkValue::BuiltinFunction(BuiltinFunction::new("len", |_, _| {
            Ok(TreewalkValue::None)
        }));
        let Value::Opaque(handle) = Value::from(function.clone()) else {
            panic!("functions cross as opaque handles");
        };
        assert_eq!(handle.type_name(), "builtin_function_or_method");
        let back = TreewalkValue::try_from(Value::Opaque(handle)).unwrap();
        assert_eq!(back.identity(), function.identity());
    }
}
