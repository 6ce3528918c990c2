use crate::{
    core::Container,
    domain::Type,
    treewalk::{
        builtins::functions::new_object,
        types::{
            Class, Classmethod, Dict, Exception, Property, Range, Slice, Staticmethod, Super,
        },
        utils::{args, check_args, repr_str, Args},
        Raise, Scope, TreewalkInterpreter, TreewalkResult, TreewalkValue,
    },
};

/// Call a builtin, non-exception class such as `int("3")` or `dict(a=1)`.
pub fn construct(
    interpreter: &TreewalkInterpreter,
    builtin: Type,
    args: Args,
) -> TreewalkResult<TreewalkValue> {
    match builtin {
        Type::Object => {
            check_args(&args, "object", 0, 0, &[]).raise(interpreter)?;
            Ok(new_object(interpreter))
        }
        Type::Type => new_type(interpreter, args),
        Type::Bool => {
            check_args(&args, "bool", 0, 1, &[]).raise(interpreter)?;
            match args.get_arg_opt(0) {
                Some(value) => interpreter.truthy(&value).map(TreewalkValue::Bool),
                None => Ok(TreewalkValue::Bool(false)),
            }
        }
        Type::Int => new_int(interpreter, args),
        Type::Float => new_float(interpreter, args),
        Type::Str => new_str(interpreter, args),
        Type::List => {
            check_args(&args, "list", 0, 1, &[]).raise(interpreter)?;
            let items = match args.get_arg_opt(0) {
                Some(iterable) => interpreter.iterate(&iterable)?,
                None => vec![],
            };
            Ok(TreewalkValue::new_list(items))
        }
        Type::Tuple => {
            check_args(&args, "tuple", 0, 1, &[]).raise(interpreter)?;
            let items = match args.get_arg_opt(0) {
                Some(iterable) => interpreter.iterate(&iterable)?,
                None => vec![],
            };
            Ok(TreewalkValue::new_tuple(items))
        }
        Type::Dict => new_dict(interpreter, args),
        Type::Bytes => new_bytes(interpreter, args),
        Type::Range => {
            check_args(&args, "range", 1, 3, &[]).raise(interpreter)?;
            let bounds = args
                .positional()
                .iter()
                .map(|arg| arg.as_int())
                .collect::<Result<Vec<_>, _>>()
                .raise(interpreter)?;
            let range = match bounds.as_slice() {
                [stop] => Range::new(0, *stop, 1),
                [start, stop] => Range::new(*start, *stop, 1),
                [start, stop, step] => Range::new(*start, *stop, *step),
                _ => unreachable!("arity checked above"),
            };
            range.map(TreewalkValue::Range).raise(interpreter)
        }
        Type::Slice => {
            check_args(&args, "slice", 1, 3, &[]).raise(interpreter)?;
            let bound = |value: TreewalkValue| match value {
                TreewalkValue::None => Ok(None),
                other => other.as_int().map(Some),
            };
            let parts = args
                .positional()
                .iter()
                .cloned()
                .map(bound)
                .collect::<Result<Vec<_>, _>>()
                .raise(interpreter)?;
            let slice = match parts.as_slice() {
                [stop] => Slice::new(None, *stop, None),
                [start, stop] => Slice::new(*start, *stop, None),
                [start, stop, step] => Slice::new(*start, *stop, *step),
                _ => unreachable!("arity checked above"),
            };
            Ok(TreewalkValue::Slice(slice))
        }
        Type::Staticmethod => {
            check_args(&args, "staticmethod", 1, 1, &[]).raise(interpreter)?;
            Ok(TreewalkValue::Staticmethod(Staticmethod {
                func: Box::new(args.get_arg(0)),
            }))
        }
        Type::Classmethod => {
            check_args(&args, "classmethod", 1, 1, &[]).raise(interpreter)?;
            Ok(TreewalkValue::Classmethod(Classmethod {
                func: Box::new(args.get_arg(0)),
            }))
        }
        Type::Property => {
            check_args(&args, "property", 1, 2, &["fget", "fset"]).raise(interpreter)?;
            let fget = args.get_kwarg("fget").unwrap_or_else(|| args.get_arg(0));
            let property = Property::new(fget);
            Ok(TreewalkValue::Property(
                match args.get_kwarg("fset").or_else(|| args.get_arg_opt(1)) {
                    Some(fset) if !fset.is_none() => property.with_setter(fset),
                    _ => property,
                },
            ))
        }
        Type::Super => {
            check_args(&args, "super", 0, 2, &[]).raise(interpreter)?;
            match args.positional() {
                [] => Exception::runtime_error("super(): no arguments").raise(interpreter),
                [TreewalkValue::Class(class), receiver] => Ok(TreewalkValue::Super(Super {
                    class: class.clone(),
                    receiver: Box::new(receiver.clone()),
                })),
                [TreewalkValue::Class(_)] => {
                    Exception::type_error("unbound super objects are not supported")
                        .raise(interpreter)
                }
                [other, ..] => Exception::type_error(format!(
                    "super() argument 1 must be a type, not {}",
                    other.type_name()
                ))
                .raise(interpreter),
            }
        }
        other => Exception::type_error(format!("cannot create '{}' instances", other.name()))
            .raise(interpreter),
    }
}

/// `type(x)` reports a class; `type(name, bases, namespace)` creates one.
fn new_type(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "type", 1, 3, &[]).raise(interpreter)?;
    match args.positional() {
        [value] => Ok(TreewalkValue::Class(interpreter.class_of(value))),
        [name, bases, namespace] => {
            let name = name.as_str().raise(interpreter)?;
            let mut classes = vec![];
            for base in interpreter.iterate(bases)? {
                match base.as_class() {
                    Some(class) => classes.push(class),
                    None => {
                        return Exception::type_error(format!(
                            "bases must be types, not '{}'",
                            base.type_name()
                        ))
                        .raise(interpreter)
                    }
                }
            }
            if classes.is_empty() {
                classes.push(interpreter.state.class(Type::Object));
            }

            let TreewalkValue::Dict(namespace) = namespace else {
                return Exception::type_error(format!(
                    "type.__new__() argument 3 must be dict, not {}",
                    namespace.type_name()
                ))
                .raise(interpreter);
            };
            let mut scope = Scope::default();
            for (key, value) in namespace.borrow().iter() {
                scope.insert(&key.as_str().raise(interpreter)?, value.clone());
            }
            let module = scope
                .get("__module__")
                .and_then(|m| m.as_str().ok())
                .unwrap_or_else(|| "builtins".to_string());

            let class = Class::new_user(&name, &name, &module, classes, scope).raise(interpreter)?;
            Ok(TreewalkValue::Class(Container::new(class)))
        }
        _ => Exception::type_error("type() takes 1 or 3 arguments").raise(interpreter),
    }
}

fn new_int(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "int", 0, 2, &["base"]).raise(interpreter)?;
    let base = args.get_kwarg("base").or_else(|| args.get_arg_opt(1));
    let Some(value) = args.get_arg_opt(0) else {
        return Ok(TreewalkValue::Int(0));
    };

    match (&value, base) {
        (TreewalkValue::Str(s), base) => {
            let base = match base {
                Some(base) => base.as_int().raise(interpreter)?,
                None => 10,
            };
            parse_int(s, base).map(TreewalkValue::Int).raise(interpreter)
        }
        (_, Some(_)) => {
            Exception::type_error("int() can't convert non-string with explicit base")
                .raise(interpreter)
        }
        (TreewalkValue::Int(i), _) => Ok(TreewalkValue::Int(*i)),
        (TreewalkValue::Bool(b), _) => Ok(TreewalkValue::Int(*b as i64)),
        (TreewalkValue::Float(f), _) => {
            if f.is_nan() {
                return Exception::value_error("cannot convert float NaN to integer")
                    .raise(interpreter);
            }
            if f.is_infinite() || f.trunc().abs() >= i64::MAX as f64 {
                return Exception::overflow_error("cannot convert float infinity to integer")
                    .raise(interpreter);
            }
            Ok(TreewalkValue::Int(f.trunc() as i64))
        }
        _ => {
            for dunder in ["__int__", "__index__"] {
                if let Some(result) = interpreter.call_dunder(&value, dunder, args![])? {
                    return Ok(TreewalkValue::Int(result.as_int().raise(interpreter)?));
                }
            }
            Exception::type_error(format!(
                "int() argument must be a string, a bytes-like object or a real number, not '{}'",
                value.type_name()
            ))
            .raise(interpreter)
        }
    }
}

/// Parse an integer literal the way `int(s, base)` does: surrounding whitespace, a sign, an
/// optional prefix matching the base, and single underscores between digits.
fn parse_int(text: &str, base: i64) -> Result<i64, Exception> {
    let invalid = || {
        Exception::value_error(format!(
            "invalid literal for int() with base {base}: {}",
            repr_str(text)
        ))
    };
    if !(base == 0 || (2..=36).contains(&base)) {
        return Err(Exception::value_error("int() base must be >= 2 and <= 36, or 0"));
    }

    let trimmed = text.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let lower = unsigned.to_ascii_lowercase();
    let (radix, digits) = match (base, lower.get(..2)) {
        (0 | 16, Some("0x")) => (16, &unsigned[2..]),
        (0 | 8, Some("0o")) => (8, &unsigned[2..]),
        (0 | 2, Some("0b")) => (2, &unsigned[2..]),
        (0, _) => (10, unsigned),
        (base, _) => (base as u32, unsigned),
    };

    if digits.is_empty()
        || digits.starts_with('_')
        || digits.ends_with('_')
        || digits.contains("__")
        || !digits.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(invalid());
    }
    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    let magnitude = i64::from_str_radix(&cleaned, radix).map_err(|_| invalid())?;
    Ok(if negative { -magnitude } else { magnitude })
}

fn new_float(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "float", 0, 1, &[]).raise(interpreter)?;
    let Some(value) = args.get_arg_opt(0) else {
        return Ok(TreewalkValue::Float(0.0));
    };

    match &value {
        TreewalkValue::Str(s) => {
            let cleaned = s.trim().to_ascii_lowercase().replace('_', "");
            let parsed = match cleaned.trim_start_matches(['+', '-']) {
                "inf" | "infinity" | "nan" => cleaned.parse::<f64>().ok(),
                _ => cleaned.parse::<f64>().ok().filter(|f| f.is_finite()),
            };
            parsed
                .map(TreewalkValue::Float)
                .ok_or_else(|| {
                    Exception::value_error(format!("could not convert string to float: {}", value.repr()))
                })
                .raise(interpreter)
        }
        TreewalkValue::Int(_) | TreewalkValue::Bool(_) | TreewalkValue::Float(_) => {
            value.as_float().map(TreewalkValue::Float).raise(interpreter)
        }
        _ => match interpreter.call_dunder(&value, "__float__", args![])? {
            Some(result) => result.as_float().map(TreewalkValue::Float).raise(interpreter),
            None => Exception::type_error(format!(
                "float() argument must be a string or a real number, not '{}'",
                value.type_name()
            ))
            .raise(interpreter),
        },
    }
}

fn new_str(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "str", 0, 3, &["encoding", "errors"]).raise(interpreter)?;
    let Some(value) = args.get_arg_opt(0) else {
        return Ok(TreewalkValue::Str(String::new()));
    };
    let decoding = args.get_kwarg("encoding").is_some() || args.len() > 1;
    match value {
        TreewalkValue::Bytes(bytes) if decoding => String::from_utf8(bytes)
            .map(TreewalkValue::Str)
            .map_err(|e| Exception::value_error(format!("'utf-8' codec can't decode bytes: {e}")))
            .raise(interpreter),
        other => interpreter.to_str(&other).map(TreewalkValue::Str),
    }
}

fn new_dict(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    if args.len() > 1 {
        return Exception::type_error(format!(
            "dict expected at most 1 argument, got {}",
            args.len()
        ))
        .raise(interpreter);
    }

    let mut dict = Dict::default();
    if let Some(source) = args.get_arg_opt(0) {
        update_dict(interpreter, &mut dict, &source)?;
    }
    for (key, value) in args.keywords() {
        dict.insert(TreewalkValue::str(key), value.clone())
            .raise(interpreter)?;
    }
    Ok(TreewalkValue::new_dict(dict))
}

/// Merge a mapping, or an iterable of key/value pairs, into `dict`.
pub(super) fn update_dict(
    interpreter: &TreewalkInterpreter,
    dict: &mut Dict,
    source: &TreewalkValue,
) -> TreewalkResult<()> {
    if let TreewalkValue::Dict(other) = source {
        let other = other.borrow().clone();
        return dict.extend(&other).raise(interpreter);
    }

    for (i, entry) in interpreter.iterate(source)?.into_iter().enumerate() {
        let pair = interpreter.iterate(&entry).map_err(|_| {
            interpreter.raise(Exception::type_error(format!(
                "cannot convert dictionary update sequence element #{i} to a sequence"
            )))
        })?;
        match pair.as_slice() {
            [key, value] => dict.insert(key.clone(), value.clone()).raise(interpreter)?,
            _ => {
                return Exception::value_error(format!(
                    "dictionary update sequence element #{i} has length {}; 2 is required",
                    pair.len()
                ))
                .raise(interpreter)
            }
        }
    }
    Ok(())
}

fn new_bytes(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "bytes", 0, 3, &["encoding", "errors"]).raise(interpreter)?;
    let Some(value) = args.get_arg_opt(0) else {
        return Ok(TreewalkValue::Bytes(vec![]));
    };
    match value {
        TreewalkValue::Str(s) => {
            if args.get_kwarg("encoding").is_none() && args.len() < 2 {
                return Exception::type_error("string argument without an encoding")
                    .raise(interpreter);
            }
            Ok(TreewalkValue::Bytes(s.into_bytes()))
        }
        TreewalkValue::Int(n) if n < 0 => {
            Exception::value_error("negative count").raise(interpreter)
        }
        TreewalkValue::Int(n) => Ok(TreewalkValue::Bytes(vec![0; n as usize])),
        other => {
            let mut bytes = vec![];
            for item in interpreter.iterate(&other)? {
                let byte = item.as_int().raise(interpreter)?;
                match u8::try_from(byte) {
                    Ok(byte) => bytes.push(byte),
                    Err(_) => {
                        return Exception::value_error("bytes must be in range(0, 256)")
                            .raise(interpreter)
                    }
                }
            }
            Ok(TreewalkValue::Bytes(bytes))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_literals() {
        assert_eq!(parse_int(" 42 ", 10).unwrap(), 42);
        assert_eq!(parse_int("-1_000", 10).unwrap(), -1000);
        assert_eq!(parse_int("0xff", 16).unwrap(), 255);
        assert_eq!(parse_int("0o17", 0).unwrap(), 15);
        assert_eq!(parse_int("z", 36).unwrap(), 35);

        let e = parse_int("4.2", 10).unwrap_err();
        assert_eq!(e.message(), "invalid literal for int() with base 10: '4.2'");
        assert!(parse_int("1__0", 10).is_err());
    }
}
