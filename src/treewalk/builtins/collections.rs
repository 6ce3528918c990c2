use crate::{
    core::Container,
    treewalk::{
        builtins::{construct::update_dict, functions::sort_values},
        types::{BuiltinFn, Dict, Exception, List, Slice},
        utils::{check_args, check_arity, Args},
        Raise, TreewalkInterpreter, TreewalkResult, TreewalkValue,
    },
};

pub(super) static LIST_METHODS: &[(&str, BuiltinFn)] = &[
    ("append", list_append),
    ("clear", list_clear),
    ("copy", list_copy),
    ("count", sequence_count),
    ("extend", list_extend),
    ("index", sequence_index),
    ("insert", list_insert),
    ("pop", list_pop),
    ("remove", list_remove),
    ("reverse", list_reverse),
    ("sort", list_sort),
];

pub(super) static DICT_METHODS: &[(&str, BuiltinFn)] = &[
    ("clear", dict_clear),
    ("copy", dict_copy),
    ("get", dict_get),
    ("items", dict_items),
    ("keys", dict_keys),
    ("pop", dict_pop),
    ("popitem", dict_popitem),
    ("setdefault", dict_setdefault),
    ("update", dict_update),
    ("values", dict_values),
];

pub(super) static TUPLE_METHODS: &[(&str, BuiltinFn)] =
    &[("count", sequence_count), ("index", sequence_index)];

pub(super) static BYTES_METHODS: &[(&str, BuiltinFn)] =
    &[("decode", bytes_decode), ("hex", bytes_hex)];

pub(super) static INT_METHODS: &[(&str, BuiltinFn)] = &[("bit_length", int_bit_length)];

pub(super) static FLOAT_METHODS: &[(&str, BuiltinFn)] = &[("is_integer", float_is_integer)];

fn expect_list(
    interpreter: &TreewalkInterpreter,
    args: &Args,
    name: &str,
) -> TreewalkResult<Container<List>> {
    match args.get_arg(0) {
        TreewalkValue::List(list) => Ok(list),
        other => Exception::type_error(format!(
            "descriptor '{name}' for 'list' objects doesn't apply to a '{}' object",
            other.type_name()
        ))
        .raise(interpreter),
    }
}

fn expect_dict(
    interpreter: &TreewalkInterpreter,
    args: &Args,
    name: &str,
) -> TreewalkResult<Container<Dict>> {
    match args.get_arg(0) {
        TreewalkValue::Dict(dict) => Ok(dict),
        other => Exception::type_error(format!(
            "descriptor '{name}' for 'dict' objects doesn't apply to a '{}' object",
            other.type_name()
        ))
        .raise(interpreter),
    }
}

fn list_append(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "append", 2, 2, &[]).raise(interpreter)?;
    expect_list(interpreter, &args, "append")?
        .borrow_mut()
        .append(args.get_arg(1));
    Ok(TreewalkValue::None)
}

fn list_extend(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "extend", 2, 2, &[]).raise(interpreter)?;
    let list = expect_list(interpreter, &args, "extend")?;
    // Collect first so `items.extend(items)` sees the original contents.
    let items = interpreter.iterate(&args.get_arg(1))?;
    list.borrow_mut().extend(items);
    Ok(TreewalkValue::None)
}

fn list_insert(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "insert", 3, 3, &[]).raise(interpreter)?;
    let list = expect_list(interpreter, &args, "insert")?;
    let index = args.get_arg(1).as_int().raise(interpreter)?;
    list.borrow_mut().insert(index, args.get_arg(2));
    Ok(TreewalkValue::None)
}

fn list_pop(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "pop", 1, 2, &[]).raise(interpreter)?;
    let list = expect_list(interpreter, &args, "pop")?;
    let len = list.borrow().len() as i64;
    if len == 0 {
        return Exception::index_error("pop from empty list").raise(interpreter);
    }
    let index = match args.get_arg_opt(1) {
        Some(index) => index.as_int().raise(interpreter)?,
        None => -1,
    };
    let resolved = if index < 0 { index + len } else { index };
    if !(0..len).contains(&resolved) {
        return Exception::index_error("pop index out of range").raise(interpreter);
    }
    let item = list.borrow_mut().remove_at(resolved as usize);
    Ok(item)
}

fn list_remove(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "remove", 2, 2, &[]).raise(interpreter)?;
    let list = expect_list(interpreter, &args, "remove")?;
    let target = args.get_arg(1);
    let items = list.borrow().to_vec();
    for (i, item) in items.iter().enumerate() {
        if interpreter.equals(item, &target)? {
            list.borrow_mut().remove_at(i);
            return Ok(TreewalkValue::None);
        }
    }
    Exception::value_error("list.remove(x): x not in list").raise(interpreter)
}

fn list_reverse(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "reverse", 1, 1, &[]).raise(interpreter)?;
    expect_list(interpreter, &args, "reverse")?.borrow_mut().reverse();
    Ok(TreewalkValue::None)
}

fn list_clear(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "clear", 1, 1, &[]).raise(interpreter)?;
    expect_list(interpreter, &args, "clear")?.borrow_mut().clear();
    Ok(TreewalkValue::None)
}

fn list_copy(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "copy", 1, 1, &[]).raise(interpreter)?;
    let items = expect_list(interpreter, &args, "copy")?.borrow().to_vec();
    Ok(TreewalkValue::new_list(items))
}

/// `list.sort(key=None, reverse=False)`: stable and in place. The list is left untouched when a
/// comparison raises.
fn list_sort(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "sort", 1, 1, &["key", "reverse"]).raise(interpreter)?;
    let list = expect_list(interpreter, &args, "sort")?;
    let key = args.get_kwarg("key").unwrap_or(TreewalkValue::None);
    let reverse = match args.get_kwarg("reverse") {
        Some(flag) => interpreter.truthy(&flag)?,
        None => false,
    };
    let items = list.borrow().to_vec();
    let sorted = sort_values(interpreter, items, &key, reverse)?;
    list.borrow_mut().replace(sorted);
    Ok(TreewalkValue::None)
}

fn sequence_items(
    interpreter: &TreewalkInterpreter,
    receiver: &TreewalkValue,
    name: &str,
) -> TreewalkResult<Vec<TreewalkValue>> {
    match receiver {
        TreewalkValue::List(list) => Ok(list.borrow().to_vec()),
        TreewalkValue::Tuple(tuple) => Ok(tuple.to_vec()),
        other => Exception::type_error(format!(
            "descriptor '{name}' doesn't apply to a '{}' object",
            other.type_name()
        ))
        .raise(interpreter),
    }
}

fn sequence_count(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "count", 2, 2, &[]).raise(interpreter)?;
    let target = args.get_arg(1);
    let mut found = 0;
    for item in sequence_items(interpreter, &args.get_arg(0), "count")? {
        if interpreter.equals(&item, &target)? {
            found += 1;
        }
    }
    Ok(TreewalkValue::Int(found))
}

fn sequence_index(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "index", 2, 4, &[]).raise(interpreter)?;
    let receiver = args.get_arg(0);
    let items = sequence_items(interpreter, &receiver, "index")?;
    let bound = |i: usize| match args.get_arg_opt(i) {
        None | Some(TreewalkValue::None) => Ok(None),
        Some(value) => value.as_int().map(Some),
    };
    let (start, end) = Slice::new(
        bound(2).raise(interpreter)?,
        bound(3).raise(interpreter)?,
        None,
    )
    .bounds(items.len());

    let target = args.get_arg(1);
    for (i, item) in items.iter().enumerate().take(end).skip(start) {
        if interpreter.equals(item, &target)? {
            return Ok(TreewalkValue::Int(i as i64));
        }
    }
    let message = match receiver {
        TreewalkValue::Tuple(_) => "tuple.index(x): x not in tuple".to_string(),
        _ => format!("{} is not in list", interpreter.repr(&target)?),
    };
    Exception::value_error(message).raise(interpreter)
}

fn dict_get(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "get", 2, 3, &[]).raise(interpreter)?;
    let dict = expect_dict(interpreter, &args, "get")?;
    let found = dict.borrow().get(&args.get_arg(1)).raise(interpreter)?;
    Ok(found.unwrap_or_else(|| args.get_arg(2)))
}

fn dict_keys(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "keys", 1, 1, &[]).raise(interpreter)?;
    let keys = expect_dict(interpreter, &args, "keys")?.borrow().keys();
    Ok(TreewalkValue::new_list(keys))
}

fn dict_values(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "values", 1, 1, &[]).raise(interpreter)?;
    let values = expect_dict(interpreter, &args, "values")?.borrow().values();
    Ok(TreewalkValue::new_list(values))
}

fn dict_items(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "items", 1, 1, &[]).raise(interpreter)?;
    let items = expect_dict(interpreter, &args, "items")?.borrow().items();
    Ok(TreewalkValue::new_list(
        items
            .into_iter()
            .map(|(k, v)| TreewalkValue::new_tuple(vec![k, v]))
            .collect(),
    ))
}

fn dict_pop(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "pop", 2, 3, &[]).raise(interpreter)?;
    let dict = expect_dict(interpreter, &args, "pop")?;
    let key = args.get_arg(1);
    let removed = dict.borrow_mut().remove(&key).raise(interpreter)?;
    match (removed, args.get_arg_opt(2)) {
        (Some(value), _) => Ok(value),
        (None, Some(default)) => Ok(default),
        (None, None) => Exception::key_error(key).raise(interpreter),
    }
}

fn dict_popitem(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "popitem", 1, 1, &[]).raise(interpreter)?;
    let popped = expect_dict(interpreter, &args, "popitem")?.borrow_mut().pop_last();
    match popped {
        Some((key, value)) => Ok(TreewalkValue::new_tuple(vec![key, value])),
        None => Exception::key_error(TreewalkValue::str("popitem(): dictionary is empty"))
            .raise(interpreter),
    }
}

fn dict_setdefault(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "setdefault", 2, 3, &[]).raise(interpreter)?;
    let dict = expect_dict(interpreter, &args, "setdefault")?;
    let key = args.get_arg(1);
    let existing = dict.borrow().get(&key).raise(interpreter)?;
    if let Some(value) = existing {
        return Ok(value);
    }
    let default = args.get_arg(2);
    dict.borrow_mut()
        .insert(key, default.clone())
        .raise(interpreter)?;
    Ok(default)
}

fn dict_update(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_arity(&args, "update", 1, 2).raise(interpreter)?;
    let dict = expect_dict(interpreter, &args, "update")?;
    // Build the update separately so a user `keys()` or iteration never sees a borrowed dict.
    let mut update = Dict::default();
    if let Some(source) = args.get_arg_opt(1) {
        update_dict(interpreter, &mut update, &source)?;
    }
    for (key, value) in args.keywords() {
        update
            .insert(TreewalkValue::str(key), value.clone())
            .raise(interpreter)?;
    }
    dict.borrow_mut().extend(&update).raise(interpreter)?;
    Ok(TreewalkValue::None)
}

fn dict_clear(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "clear", 1, 1, &[]).raise(interpreter)?;
    expect_dict(interpreter, &args, "clear")?.borrow_mut().clear();
    Ok(TreewalkValue::None)
}

fn dict_copy(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "copy", 1, 1, &[]).raise(interpreter)?;
    let copy = expect_dict(interpreter, &args, "copy")?.borrow().clone();
    Ok(TreewalkValue::new_dict(copy))
}

fn bytes_decode(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "decode", 1, 3, &["encoding", "errors"]).raise(interpreter)?;
    let TreewalkValue::Bytes(bytes) = args.get_arg(0) else {
        return Exception::type_error("descriptor 'decode' requires a 'bytes' object")
            .raise(interpreter);
    };
    match String::from_utf8(bytes) {
        Ok(text) => Ok(TreewalkValue::Str(text)),
        Err(e) => Exception::value_error(format!(
            "'utf-8' codec can't decode byte 0x{:02x} in position {}",
            e.as_bytes()[e.utf8_error().valid_up_to()],
            e.utf8_error().valid_up_to()
        ))
        .raise(interpreter),
    }
}

fn bytes_hex(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "hex", 1, 1, &[]).raise(interpreter)?;
    let TreewalkValue::Bytes(bytes) = args.get_arg(0) else {
        return Exception::type_error("descriptor 'hex' requires a 'bytes' object")
            .raise(interpreter);
    };
    Ok(TreewalkValue::Str(
        bytes.iter().map(|b| format!("{b:02x}")).collect(),
    ))
}

fn int_bit_length(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "bit_length", 1, 1, &[]).raise(interpreter)?;
    let value = args.get_arg(0).as_int().raise(interpreter)?;
    Ok(TreewalkValue::Int(
        (u64::BITS - value.unsigned_abs().leading_zeros()) as i64,
    ))
}

fn float_is_integer(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "is_integer", 1, 1, &[]).raise(interpreter)?;
    let value = args.get_arg(0).as_float().raise(interpreter)?;
    Ok(TreewalkValue::Bool(value.is_finite() && value.fract() == 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::treewalk::{utils::args, ModuleRegistry};

    fn interpreter() -> TreewalkInterpreter {
        TreewalkInterpreter::new(ModuleRegistry::new(), vec![])
    }

    fn ints(values: &[i64]) -> TreewalkValue {
        TreewalkValue::new_list(values.iter().map(|i| TreewalkValue::Int(*i)).collect())
    }

    #[test]
    fn list_mutation() {
        let interpreter = interpreter();
        let list = ints(&[3, 1, 2]);

        list_append(&interpreter, args![list.clone(), TreewalkValue::Int(1)]).unwrap();
        assert_eq!(list, ints(&[3, 1, 2, 1]));

        list_remove(&interpreter, args![list.clone(), TreewalkValue::Int(1)]).unwrap();
        assert_eq!(list, ints(&[3, 2, 1]));

        let popped = list_pop(&interpreter, args![list.clone(), TreewalkValue::Int(0)]).unwrap();
        assert_eq!(popped, TreewalkValue::Int(3));

        list_sort(&interpreter, args![list.clone()]).unwrap();
        assert_eq!(list, ints(&[1, 2]));

        let e = list_pop(&interpreter, args![ints(&[])]).unwrap_err();
        assert_eq!(e.exception.message(), "pop from empty list");
    }

    #[test]
    fn index_with_bounds() {
        let interpreter = interpreter();
        let list = ints(&[5, 6, 5]);
        let found = sequence_index(
            &interpreter,
            args![list.clone(), TreewalkValue::Int(5), TreewalkValue::Int(1)],
        )
        .unwrap();
        assert_eq!(found, TreewalkValue::Int(2));

        let e = sequence_index(&interpreter, args![list, TreewalkValue::Int(7)]).unwrap_err();
        assert_eq!(e.exception.message(), "7 is not in list");
    }

    #[test]
    fn dict_methods() {
        let interpreter = interpreter();
        let dict = TreewalkValue::new_dict(Dict::default());

        let value = dict_setdefault(
            &interpreter,
            args![dict.clone(), "a".into(), TreewalkValue::Int(1)],
        )
        .unwrap();
        assert_eq!(value, TreewalkValue::Int(1));

        let update = Args::with_keywords(
            vec![dict.clone()],
            vec![("b".into(), TreewalkValue::Int(2))],
        );
        dict_update(&interpreter, update).unwrap();
        assert_eq!(
            dict_keys(&interpreter, args![dict.clone()]).unwrap(),
            TreewalkValue::new_list(vec!["a".into(), "b".into()])
        );

        assert_eq!(
            dict_pop(&interpreter, args![dict.clone(), "z".into(), TreewalkValue::None]).unwrap(),
            TreewalkValue::None
        );
        assert!(dict_pop(&interpreter, args![dict, "z".into()]).is_err());
    }

    #[test]
    fn numeric_methods() {
        let interpreter = interpreter();
        assert_eq!(
            int_bit_length(&interpreter, args![TreewalkValue::Int(-37)]).unwrap(),
            TreewalkValue::Int(6)
        );
        assert_eq!(
            float_is_integer(&interpreter, args![TreewalkValue::Float(2.0)]).unwrap(),
            TreewalkValue::Bool(true)
        );
    }
}
