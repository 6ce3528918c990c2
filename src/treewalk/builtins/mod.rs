//! Functions and methods implemented in Rust. Methods take their receiver as the first
//! positional argument so that `str.join(sep, items)` and `sep.join(items)` share one
//! implementation.

mod collections;
mod construct;
mod functions;
mod object;
mod string;

use crate::{
    domain::Type,
    treewalk::types::{BuiltinFn, BuiltinFunction},
};

pub use construct::construct;
pub use object::{object_method, PROPERTY_SETTER};

/// Everything bound by name in the `builtins` namespace besides the builtin classes.
pub fn functions() -> Vec<BuiltinFunction> {
    functions::BUILTINS
        .iter()
        .map(|(name, func)| BuiltinFunction::new(*name, *func))
        .collect()
}

/// The builtin method `name` of instances of `builtin`.
pub fn type_method(builtin: Type, name: &str) -> Option<BuiltinFunction> {
    methods_of(builtin)
        .iter()
        .find(|(method, _)| *method == name)
        .map(|(method, func)| BuiltinFunction::new(*method, *func))
}

/// Names every builtin method of `builtin`, for `dir()`.
pub fn type_method_names(builtin: Type) -> Vec<&'static str> {
    methods_of(builtin).iter().map(|(name, _)| *name).collect()
}

fn methods_of(builtin: Type) -> &'static [(&'static str, BuiltinFn)] {
    match builtin {
        Type::Str => string::METHODS,
        Type::List => collections::LIST_METHODS,
        Type::Dict => collections::DICT_METHODS,
        Type::Tuple => collections::TUPLE_METHODS,
        Type::Bytes => collections::BYTES_METHODS,
        Type::Int | Type::Bool => collections::INT_METHODS,
        Type::Float => collections::FLOAT_METHODS,
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_type() {
        assert_eq!(type_method(Type::Str, "join").map(|m| m.name()), Some("join"));
        assert_eq!(type_method(Type::Bool, "bit_length").map(|m| m.name()), Some("bit_length"));
        assert!(type_method(Type::List, "join").is_none());
        assert!(type_method(Type::Module, "anything").is_none());
    }

    #[test]
    fn builtin_names_are_unique() {
        let mut names: Vec<_> = functions().iter().map(|f| f.name()).collect();
        let count = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), count);
    }
}
