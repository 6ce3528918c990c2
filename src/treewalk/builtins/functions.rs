use std::{
    cmp::Ordering,
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use crate::{
    core::Container,
    domain::Type,
    parser::types::{BinOp, CompareOp},
    treewalk::{
        builtins::type_method_names,
        types::{BuiltinFn, Class, Exception, Object},
        utils::{args, check_args, format_with_spec, Args, HashKey},
        Raise, TreewalkInterpreter, TreewalkResult, TreewalkValue,
    },
};

pub(super) static BUILTINS: [(&str, BuiltinFn); 37] = [
    ("abs", abs),
    ("all", all),
    ("any", any),
    ("bin", bin),
    ("callable", callable),
    ("chr", chr),
    ("delattr", delattr),
    ("dir", dir),
    ("divmod", divmod),
    ("enumerate", enumerate),
    ("filter", filter),
    ("format", format),
    ("getattr", getattr),
    ("hasattr", hasattr),
    ("hash", hash),
    ("hex", hex),
    ("id", id),
    ("isinstance", isinstance),
    ("issubclass", issubclass),
    ("iter", iter),
    ("len", len),
    ("map", map),
    ("max", max),
    ("min", min),
    ("next", next),
    ("oct", oct),
    ("ord", ord),
    ("pow", pow),
    ("print", print),
    ("repr", repr),
    ("reversed", reversed),
    ("round", round),
    ("setattr", setattr),
    ("sorted", sorted),
    ("sum", sum),
    ("vars", vars),
    ("zip", zip),
];

/// Sort by `key` (or by the items themselves when `key` is `None`), keeping equal items in their
/// original order even when reversed.
pub(super) fn sort_values(
    interpreter: &TreewalkInterpreter,
    items: Vec<TreewalkValue>,
    key: &TreewalkValue,
    reverse: bool,
) -> TreewalkResult<Vec<TreewalkValue>> {
    let mut keyed = Vec::with_capacity(items.len());
    for item in items {
        let sort_key = if key.is_none() {
            item.clone()
        } else {
            interpreter.call(key, args![item.clone()])?
        };
        keyed.push((sort_key, item));
    }

    let mut error = None;
    keyed.sort_by(|(a, _), (b, _)| {
        if error.is_some() {
            return Ordering::Equal;
        }
        let (a, b) = if reverse { (b, a) } else { (a, b) };
        order_of(interpreter, a, b).unwrap_or_else(|e| {
            error = Some(e);
            Ordering::Equal
        })
    });

    match error {
        Some(e) => Err(e),
        None => Ok(keyed.into_iter().map(|(_, item)| item).collect()),
    }
}

/// Ordering through `<` alone, which is all that sorting requires of user classes.
fn order_of(
    interpreter: &TreewalkInterpreter,
    a: &TreewalkValue,
    b: &TreewalkValue,
) -> TreewalkResult<Ordering> {
    if interpreter.compare(&CompareOp::LessThan, a, b)? {
        Ok(Ordering::Less)
    } else if interpreter.compare(&CompareOp::LessThan, b, a)? {
        Ok(Ordering::Greater)
    } else {
        Ok(Ordering::Equal)
    }
}

/// The positional arguments of `min`/`max`/`zip`-style builtins: a single iterable, or the
/// arguments themselves.
fn items_or_iterable(
    interpreter: &TreewalkInterpreter,
    args: &Args,
) -> TreewalkResult<Vec<TreewalkValue>> {
    match args.positional() {
        [single] => interpreter.iterate(single),
        many => Ok(many.to_vec()),
    }
}

fn abs(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "abs", 1, 1, &[]).raise(interpreter)?;
    let value = args.get_arg(0);
    match value {
        TreewalkValue::Int(i) => i
            .checked_abs()
            .map(TreewalkValue::Int)
            .ok_or_else(|| Exception::overflow_error("integer overflow"))
            .raise(interpreter),
        TreewalkValue::Bool(b) => Ok(TreewalkValue::Int(b as i64)),
        TreewalkValue::Float(f) => Ok(TreewalkValue::Float(f.abs())),
        other => match interpreter.call_dunder(&other, "__abs__", args![])? {
            Some(result) => Ok(result),
            None => Exception::type_error(format!(
                "bad operand type for abs(): '{}'",
                other.type_name()
            ))
            .raise(interpreter),
        },
    }
}

fn all(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "all", 1, 1, &[]).raise(interpreter)?;
    for item in interpreter.iterate(&args.get_arg(0))? {
        if !interpreter.truthy(&item)? {
            return Ok(TreewalkValue::Bool(false));
        }
    }
    Ok(TreewalkValue::Bool(true))
}

fn any(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "any", 1, 1, &[]).raise(interpreter)?;
    for item in interpreter.iterate(&args.get_arg(0))? {
        if interpreter.truthy(&item)? {
            return Ok(TreewalkValue::Bool(true));
        }
    }
    Ok(TreewalkValue::Bool(false))
}

fn radix(
    interpreter: &TreewalkInterpreter,
    args: &Args,
    name: &str,
    prefix: &str,
    render: fn(u64) -> String,
) -> TreewalkResult<TreewalkValue> {
    check_args(args, name, 1, 1, &[]).raise(interpreter)?;
    let i = args.get_arg(0).as_int().raise(interpreter)?;
    let sign = if i < 0 { "-" } else { "" };
    Ok(TreewalkValue::Str(format!(
        "{sign}{prefix}{}",
        render(i.unsigned_abs())
    )))
}

fn bin(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    radix(interpreter, &args, "bin", "0b", |n| format!("{n:b}"))
}

fn hex(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    radix(interpreter, &args, "hex", "0x", |n| format!("{n:x}"))
}

fn oct(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    radix(interpreter, &args, "oct", "0o", |n| format!("{n:o}"))
}

fn callable(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "callable", 1, 1, &[]).raise(interpreter)?;
    let value = args.get_arg(0);
    Ok(TreewalkValue::Bool(
        value.is_callable() || matches!(value, TreewalkValue::Staticmethod(_)),
    ))
}

fn chr(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "chr", 1, 1, &[]).raise(interpreter)?;
    let code = args.get_arg(0).as_int().raise(interpreter)?;
    u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .map(|c| TreewalkValue::Str(c.to_string()))
        .ok_or_else(|| Exception::value_error("chr() arg not in range(0x110000)"))
        .raise(interpreter)
}

fn ord(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "ord", 1, 1, &[]).raise(interpreter)?;
    let value = args.get_arg(0);
    let s = value.as_str().raise(interpreter)?;
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(TreewalkValue::Int(c as i64)),
        _ => Exception::type_error(format!(
            "ord() expected a character, but string of length {} found",
            s.chars().count()
        ))
        .raise(interpreter),
    }
}

fn delattr(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "delattr", 2, 2, &[]).raise(interpreter)?;
    let name = args.get_arg(1).as_str().raise(interpreter)?;
    interpreter.delete_attr(&args.get_arg(0), &name)?;
    Ok(TreewalkValue::None)
}

fn dir(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "dir", 1, 1, &[]).raise(interpreter)?;
    let value = args.get_arg(0);
    let mut names: Vec<String> = match &value {
        TreewalkValue::Module(module) => module.borrow().scope().symbols(),
        TreewalkValue::Class(class) => class_members(class),
        TreewalkValue::Object(object) => {
            let object = object.borrow();
            let mut names = object.scope().symbols();
            names.extend(class_members(object.class()));
            names
        }
        other => type_method_names(other.get_type())
            .into_iter()
            .map(str::to_string)
            .collect(),
    };
    names.sort();
    names.dedup();
    Ok(TreewalkValue::new_list(
        names.into_iter().map(TreewalkValue::Str).collect(),
    ))
}

fn class_members(class: &Container<Class>) -> Vec<String> {
    let mut names = vec![];
    for ancestor in class.mro() {
        let ancestor = ancestor.borrow();
        names.extend(ancestor.scope().symbols());
        if let Some(builtin) = ancestor.builtin() {
            names.extend(type_method_names(builtin).into_iter().map(str::to_string));
        }
    }
    names
}

fn divmod(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "divmod", 2, 2, &[]).raise(interpreter)?;
    let (a, b) = (args.get_arg(0), args.get_arg(1));
    let quotient = interpreter.binary_op(&BinOp::IntegerDiv, a.clone(), b.clone())?;
    let remainder = interpreter.binary_op(&BinOp::Mod, a, b)?;
    Ok(TreewalkValue::new_tuple(vec![quotient, remainder]))
}

fn enumerate(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "enumerate", 1, 2, &["start"]).raise(interpreter)?;
    let start = match args.get_kwarg("start").or_else(|| args.get_arg_opt(1)) {
        Some(start) => start.as_int().raise(interpreter)?,
        None => 0,
    };
    let items = interpreter.iterate(&args.get_arg(0))?;
    Ok(TreewalkValue::new_list(
        items
            .into_iter()
            .zip(start..)
            .map(|(item, i)| TreewalkValue::new_tuple(vec![TreewalkValue::Int(i), item]))
            .collect(),
    ))
}

fn filter(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "filter", 2, 2, &[]).raise(interpreter)?;
    let predicate = args.get_arg(0);
    let mut kept = vec![];
    for item in interpreter.iterate(&args.get_arg(1))? {
        let verdict = if predicate.is_none() {
            item.clone()
        } else {
            interpreter.call(&predicate, args![item.clone()])?
        };
        if interpreter.truthy(&verdict)? {
            kept.push(item);
        }
    }
    Ok(TreewalkValue::new_list(kept))
}

fn format(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "format", 1, 2, &[]).raise(interpreter)?;
    let value = args.get_arg(0);
    let spec = match args.get_arg_opt(1) {
        Some(spec) => spec.as_str().raise(interpreter)?,
        None => String::new(),
    };
    let text = interpreter.to_str(&value)?;
    format_with_spec(&value, &spec, &text)
        .map(TreewalkValue::Str)
        .raise(interpreter)
}

fn getattr(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "getattr", 2, 3, &[]).raise(interpreter)?;
    let name = args.get_arg(1).as_str().raise(interpreter)?;
    match (interpreter.get_attr(&args.get_arg(0), &name), args.get_arg_opt(2)) {
        (Err(e), Some(default)) if e.exception.kind == Type::AttributeError => Ok(default),
        (result, _) => result,
    }
}

fn hasattr(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "hasattr", 2, 2, &[]).raise(interpreter)?;
    let name = args.get_arg(1).as_str().raise(interpreter)?;
    match interpreter.get_attr(&args.get_arg(0), &name) {
        Ok(_) => Ok(TreewalkValue::Bool(true)),
        Err(e) if e.exception.kind == Type::AttributeError => Ok(TreewalkValue::Bool(false)),
        Err(e) => Err(e),
    }
}

fn setattr(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "setattr", 3, 3, &[]).raise(interpreter)?;
    let name = args.get_arg(1).as_str().raise(interpreter)?;
    interpreter.set_attr(&args.get_arg(0), &name, args.get_arg(2))?;
    Ok(TreewalkValue::None)
}

fn hash(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "hash", 1, 1, &[]).raise(interpreter)?;
    let value = args.get_arg(0);
    if let Some(result) = interpreter.call_dunder(&value, "__hash__", args![])? {
        return Ok(result);
    }
    Ok(TreewalkValue::Int(match interpreter.hash_key(&value)? {
        HashKey::Int(i) => i,
        other => {
            let mut hasher = DefaultHasher::new();
            other.hash(&mut hasher);
            hasher.finish() as i64
        }
    }))
}

fn id(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "id", 1, 1, &[]).raise(interpreter)?;
    let value = args.get_arg(0);
    let identity = match value.identity() {
        0 => {
            let mut hasher = DefaultHasher::new();
            value.repr().hash(&mut hasher);
            hasher.finish() as usize
        }
        identity => identity,
    };
    Ok(TreewalkValue::Int(identity as i64))
}

fn classinfo(
    interpreter: &TreewalkInterpreter,
    value: &TreewalkValue,
    name: &str,
) -> TreewalkResult<Vec<Container<Class>>> {
    match value {
        TreewalkValue::Class(class) => Ok(vec![class.clone()]),
        TreewalkValue::None => Ok(vec![interpreter.state.class(Type::None)]),
        TreewalkValue::Tuple(members) => {
            let mut classes = vec![];
            for member in members.iter() {
                classes.extend(classinfo(interpreter, member, name)?);
            }
            Ok(classes)
        }
        TreewalkValue::Union(union) => {
            let mut classes = vec![];
            for member in &union.members {
                classes.extend(classinfo(interpreter, member, name)?);
            }
            Ok(classes)
        }
        TreewalkValue::GenericAlias(_) => Exception::type_error(format!(
            "{name}() argument 2 cannot be a parameterized generic"
        ))
        .raise(interpreter),
        _ => Exception::type_error(format!(
            "{name}() arg 2 must be a type, a tuple of types, or a union"
        ))
        .raise(interpreter),
    }
}

fn isinstance(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "isinstance", 2, 2, &[]).raise(interpreter)?;
    let value = args.get_arg(0);
    let classes = classinfo(interpreter, &args.get_arg(1), "isinstance")?;
    Ok(TreewalkValue::Bool(
        classes.iter().any(|class| interpreter.isinstance(&value, class)),
    ))
}

fn issubclass(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "issubclass", 2, 2, &[]).raise(interpreter)?;
    let Some(class) = args.get_arg(0).as_class() else {
        return Exception::type_error("issubclass() arg 1 must be a class").raise(interpreter);
    };
    let classes = classinfo(interpreter, &args.get_arg(1), "issubclass")?;
    Ok(TreewalkValue::Bool(
        classes.iter().any(|other| class.is_subclass_of(other)),
    ))
}

/// Iteration is eager, so `iter()` materializes the items as a list that `next()` consumes from
/// the front.
fn iter(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "iter", 1, 1, &[]).raise(interpreter)?;
    let value = args.get_arg(0);
    if let TreewalkValue::Object(_) = value {
        if let Some(iterator) = interpreter.call_dunder(&value, "__iter__", args![])? {
            return Ok(iterator);
        }
    }
    Ok(TreewalkValue::new_list(interpreter.iterate(&value)?))
}

fn next(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "next", 1, 2, &[]).raise(interpreter)?;
    let iterator = args.get_arg(0);
    let default = args.get_arg_opt(1);
    let item = match &iterator {
        TreewalkValue::List(items) => {
            let mut items = items.borrow_mut();
            if items.is_empty() {
                None
            } else {
                Some(items.remove_at(0))
            }
        }
        TreewalkValue::Object(_) => {
            match interpreter.call_dunder(&iterator, "__next__", args![]) {
                Ok(Some(item)) => Some(item),
                Ok(None) => {
                    return Exception::type_error(format!(
                        "'{}' object is not an iterator",
                        iterator.type_name()
                    ))
                    .raise(interpreter)
                }
                Err(e) if e.exception.kind == Type::StopIteration && default.is_some() => None,
                Err(e) => return Err(e),
            }
        }
        other => {
            return Exception::type_error(format!(
                "'{}' object is not an iterator",
                other.type_name()
            ))
            .raise(interpreter)
        }
    };
    match (item, default) {
        (Some(item), _) => Ok(item),
        (None, Some(default)) => Ok(default),
        (None, None) => Exception::stop_iteration().raise(interpreter),
    }
}

fn len(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "len", 1, 1, &[]).raise(interpreter)?;
    let value = args.get_arg(0);
    let length = match &value {
        TreewalkValue::Str(s) => s.chars().count(),
        TreewalkValue::Bytes(b) => b.len(),
        TreewalkValue::List(list) => list.borrow().len(),
        TreewalkValue::Tuple(tuple) => tuple.len(),
        TreewalkValue::Dict(dict) => dict.borrow().len(),
        TreewalkValue::Range(range) => range.len(),
        _ => match interpreter.call_dunder(&value, "__len__", args![])? {
            Some(result) => {
                let length = result.as_int().raise(interpreter)?;
                if length < 0 {
                    return Exception::value_error("__len__() should return >= 0")
                        .raise(interpreter);
                }
                return Ok(TreewalkValue::Int(length));
            }
            None => {
                return Exception::type_error(format!(
                    "object of type '{}' has no len()",
                    value.type_name()
                ))
                .raise(interpreter)
            }
        },
    };
    Ok(TreewalkValue::Int(length as i64))
}

fn map(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "map", 2, usize::MAX, &[]).raise(interpreter)?;
    let function = args.get_arg(0);
    let columns = args.positional()[1..]
        .iter()
        .map(|iterable| interpreter.iterate(iterable))
        .collect::<TreewalkResult<Vec<_>>>()?;
    let shortest = columns.iter().map(Vec::len).min().unwrap_or(0);

    let mut mapped = Vec::with_capacity(shortest);
    for i in 0..shortest {
        let row = columns.iter().map(|column| column[i].clone()).collect();
        mapped.push(interpreter.call(&function, Args::new(row))?);
    }
    Ok(TreewalkValue::new_list(mapped))
}

fn extreme(
    interpreter: &TreewalkInterpreter,
    args: Args,
    name: &str,
    replace_when: CompareOp,
) -> TreewalkResult<TreewalkValue> {
    check_args(&args, name, 1, usize::MAX, &["key", "default"]).raise(interpreter)?;
    let key = args.get_kwarg("key").unwrap_or(TreewalkValue::None);
    let items = items_or_iterable(interpreter, &args)?;

    let mut best: Option<(TreewalkValue, TreewalkValue)> = None;
    for item in items {
        let item_key = if key.is_none() {
            item.clone()
        } else {
            interpreter.call(&key, args![item.clone()])?
        };
        let replace = match &best {
            None => true,
            Some((best_key, _)) => interpreter.compare(&replace_when, &item_key, best_key)?,
        };
        if replace {
            best = Some((item_key, item));
        }
    }

    match (best, args.get_kwarg("default")) {
        (Some((_, item)), _) => Ok(item),
        (None, Some(default)) => Ok(default),
        (None, None) => {
            Exception::value_error(format!("{name}() iterable argument is empty")).raise(interpreter)
        }
    }
}

fn max(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    extreme(interpreter, args, "max", CompareOp::GreaterThan)
}

fn min(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    extreme(interpreter, args, "min", CompareOp::LessThan)
}

fn pow(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "pow", 2, 3, &[]).raise(interpreter)?;
    let (base, exp) = (args.get_arg(0), args.get_arg(1));
    let Some(modulus) = args.get_arg_opt(2).filter(|m| !m.is_none()) else {
        return interpreter.binary_op(&BinOp::Expo, base, exp);
    };

    let (base, mut exp, modulus) = (
        base.as_int().raise(interpreter)?,
        exp.as_int().raise(interpreter)?,
        modulus.as_int().raise(interpreter)?,
    );
    if modulus == 0 {
        return Exception::value_error("pow() 3rd argument cannot be 0").raise(interpreter);
    }
    if exp < 0 {
        return Exception::value_error("base is not invertible for the given modulus")
            .raise(interpreter);
    }
    let modulus = modulus as i128;
    let mut result: i128 = 1;
    let mut square = (base as i128).rem_euclid(modulus);
    while exp > 0 {
        if exp & 1 == 1 {
            result = (result * square).rem_euclid(modulus);
        }
        square = (square * square).rem_euclid(modulus);
        exp >>= 1;
    }
    Ok(TreewalkValue::Int(result as i64))
}

fn print(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "print", 0, usize::MAX, &["sep", "end"]).raise(interpreter)?;
    let text_or = |name: &str, default: &str| -> TreewalkResult<String> {
        match args.get_kwarg(name) {
            None | Some(TreewalkValue::None) => Ok(default.to_string()),
            Some(value) => value.as_str().raise(interpreter),
        }
    };
    let sep = text_or("sep", " ")?;
    let end = text_or("end", "\n")?;

    let parts = args
        .positional()
        .iter()
        .map(|value| interpreter.to_str(value))
        .collect::<TreewalkResult<Vec<_>>>()?;
    print!("{}{end}", parts.join(&sep));
    Ok(TreewalkValue::None)
}

fn repr(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "repr", 1, 1, &[]).raise(interpreter)?;
    interpreter.repr(&args.get_arg(0)).map(TreewalkValue::Str)
}

fn reversed(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "reversed", 1, 1, &[]).raise(interpreter)?;
    let value = args.get_arg(0);
    if let Some(result) = interpreter.call_dunder(&value, "__reversed__", args![])? {
        return Ok(result);
    }
    let reversible = matches!(
        value,
        TreewalkValue::List(_)
            | TreewalkValue::Tuple(_)
            | TreewalkValue::Range(_)
            | TreewalkValue::Str(_)
            | TreewalkValue::Bytes(_)
            | TreewalkValue::Dict(_)
    );
    if !reversible {
        return Exception::type_error(format!(
            "'{}' object is not reversible",
            value.type_name()
        ))
        .raise(interpreter);
    }
    let mut items = interpreter.iterate(&value)?;
    items.reverse();
    Ok(TreewalkValue::new_list(items))
}

fn round(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "round", 1, 2, &["ndigits"]).raise(interpreter)?;
    let value = args.get_arg(0);
    let ndigits = args
        .get_kwarg("ndigits")
        .or_else(|| args.get_arg_opt(1))
        .filter(|n| !n.is_none());

    match (value, ndigits) {
        (TreewalkValue::Int(i), _) => Ok(TreewalkValue::Int(i)),
        (TreewalkValue::Bool(b), _) => Ok(TreewalkValue::Int(b as i64)),
        (TreewalkValue::Float(f), None) => {
            let rounded = f.round_ties_even();
            if !rounded.is_finite() {
                return Exception::overflow_error("cannot convert float infinity to integer")
                    .raise(interpreter);
            }
            Ok(TreewalkValue::Int(rounded as i64))
        }
        (TreewalkValue::Float(f), Some(ndigits)) => {
            let ndigits = ndigits.as_int().raise(interpreter)?;
            let factor = 10_f64.powi(ndigits as i32);
            Ok(TreewalkValue::Float((f * factor).round_ties_even() / factor))
        }
        (other, _) => match interpreter.call_dunder(&other, "__round__", args![])? {
            Some(result) => Ok(result),
            None => Exception::type_error(format!(
                "type {} doesn't define __round__ method",
                other.type_name()
            ))
            .raise(interpreter),
        },
    }
}

fn sorted(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "sorted", 1, 1, &["key", "reverse"]).raise(interpreter)?;
    let key = args.get_kwarg("key").unwrap_or(TreewalkValue::None);
    let reverse = match args.get_kwarg("reverse") {
        Some(reverse) => interpreter.truthy(&reverse)?,
        None => false,
    };
    let items = interpreter.iterate(&args.get_arg(0))?;
    sort_values(interpreter, items, &key, reverse).map(TreewalkValue::new_list)
}

fn sum(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "sum", 1, 2, &["start"]).raise(interpreter)?;
    let start = args
        .get_kwarg("start")
        .or_else(|| args.get_arg_opt(1))
        .unwrap_or(TreewalkValue::Int(0));
    if let TreewalkValue::Str(_) = start {
        return Exception::type_error("sum() can't sum strings [use ''.join(seq) instead]")
            .raise(interpreter);
    }

    let mut total = start;
    for item in interpreter.iterate(&args.get_arg(0))? {
        total = interpreter.binary_op(&BinOp::Add, total, item)?;
    }
    Ok(total)
}

fn vars(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "vars", 1, 1, &[]).raise(interpreter)?;
    let value = args.get_arg(0);
    match value {
        TreewalkValue::Object(_) | TreewalkValue::Class(_) | TreewalkValue::Module(_) => {
            interpreter.get_attr(&value, "__dict__")
        }
        _ => Exception::type_error("vars() argument must have __dict__ attribute")
            .raise(interpreter),
    }
}

fn zip(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "zip", 0, usize::MAX, &["strict"]).raise(interpreter)?;
    let strict = match args.get_kwarg("strict") {
        Some(strict) => interpreter.truthy(&strict)?,
        None => false,
    };
    let columns = args
        .positional()
        .iter()
        .map(|iterable| interpreter.iterate(iterable))
        .collect::<TreewalkResult<Vec<_>>>()?;
    let shortest = columns.iter().map(Vec::len).min().unwrap_or(0);
    if strict && columns.iter().any(|column| column.len() != shortest) {
        return Exception::value_error("zip() arguments have different lengths")
            .raise(interpreter);
    }

    Ok(TreewalkValue::new_list(
        (0..shortest)
            .map(|i| TreewalkValue::new_tuple(columns.iter().map(|c| c[i].clone()).collect()))
            .collect(),
    ))
}

/// A fresh instance of `object` itself, as `object()` returns.
pub(super) fn new_object(interpreter: &TreewalkInterpreter) -> TreewalkValue {
    TreewalkValue::Object(Container::new(Object::new(
        interpreter.state.class(Type::Object),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::treewalk::ModuleRegistry;

    fn interpreter() -> TreewalkInterpreter {
        TreewalkInterpreter::new(ModuleRegistry::new(), vec![])
    }

    fn ints(values: &[i64]) -> TreewalkValue {
        TreewalkValue::new_list(values.iter().map(|i| TreewalkValue::Int(*i)).collect())
    }

    #[test]
    fn sorting_is_stable_when_reversed() {
        let interpreter = interpreter();
        let pairs = vec![
            TreewalkValue::new_tuple(vec![TreewalkValue::Int(1), "a".into()]),
            TreewalkValue::new_tuple(vec![TreewalkValue::Int(2), "b".into()]),
            TreewalkValue::new_tuple(vec![TreewalkValue::Int(1), "c".into()]),
        ];
        let first = interpreter.state.builtin("len").unwrap();
        // Every tuple has length 2, so the order must not change.
        let sorted = sort_values(&interpreter, pairs.clone(), &first, true).unwrap();
        assert_eq!(sorted, pairs);
    }

    #[test]
    fn min_max_and_sum() {
        let interpreter = interpreter();
        assert_eq!(
            max(&interpreter, args![ints(&[3, 9, 2])]).unwrap(),
            TreewalkValue::Int(9)
        );
        assert_eq!(
            min(&interpreter, args![TreewalkValue::Int(4), TreewalkValue::Int(-1)]).unwrap(),
            TreewalkValue::Int(-1)
        );
        let e = max(&interpreter, args![ints(&[])]).unwrap_err();
        assert_eq!(e.exception.message(), "max() iterable argument is empty");
        assert_eq!(
            sum(&interpreter, args![ints(&[1, 2, 3])]).unwrap(),
            TreewalkValue::Int(6)
        );
    }

    #[test]
    fn rounding_is_bankers() {
        let interpreter = interpreter();
        assert_eq!(
            round(&interpreter, args![TreewalkValue::Float(2.5)]).unwrap(),
            TreewalkValue::Int(2)
        );
        assert_eq!(
            round(&interpreter, args![TreewalkValue::Float(3.5)]).unwrap(),
            TreewalkValue::Int(4)
        );
    }

    #[test]
    fn modular_pow() {
        let interpreter = interpreter();
        let result = pow(
            &interpreter,
            args![TreewalkValue::Int(3), TreewalkValue::Int(200), TreewalkValue::Int(13)],
        )
        .unwrap();
        assert_eq!(result, TreewalkValue::Int(9));
    }
}
