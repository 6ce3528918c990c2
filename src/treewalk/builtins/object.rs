use crate::treewalk::{
    interpreter::is_same,
    types::{BuiltinFn, BuiltinFunction, Exception},
    utils::{check_args, Args},
    Raise, TreewalkInterpreter, TreewalkResult, TreewalkValue,
};

/// `@prop.setter`: a copy of the property with `fset` filled in.
pub const PROPERTY_SETTER: BuiltinFunction = BuiltinFunction::new("setter", property_setter);

static METHODS: [(&str, BuiltinFn); 8] = [
    ("__init__", init),
    ("__repr__", repr),
    ("__str__", to_str),
    ("__eq__", eq),
    ("__ne__", ne),
    ("__hash__", hash),
    ("__setattr__", setattr),
    ("__getattribute__", getattribute),
];

/// Methods every object inherits from `object`, reachable through `super()` or explicit
/// `object.__init__(self)` calls.
pub fn object_method(name: &str) -> Option<BuiltinFunction> {
    METHODS
        .iter()
        .find(|(method, _)| *method == name)
        .map(|(method, func)| BuiltinFunction::new(*method, *func))
}

fn property_setter(
    interpreter: &TreewalkInterpreter,
    args: Args,
) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "setter", 2, 2, &[]).raise(interpreter)?;
    match args.get_arg(0) {
        TreewalkValue::Property(property) => {
            Ok(TreewalkValue::Property(property.with_setter(args.get_arg(1))))
        }
        other => Exception::type_error(format!(
            "descriptor 'setter' requires a 'property' object but received a '{}'",
            other.type_name()
        ))
        .raise(interpreter),
    }
}

/// Exceptions record their arguments; plain objects accept none beyond the receiver.
fn init(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    let (positional, _) = args.into_parts();
    let Some((receiver, rest)) = positional.split_first() else {
        return Exception::type_error("descriptor '__init__' of 'object' object needs an argument")
            .raise(interpreter);
    };
    if let TreewalkValue::Object(object) = receiver {
        let is_exception = object.borrow().class().is_exception();
        if is_exception {
            object
                .borrow_mut()
                .insert("args", TreewalkValue::new_tuple(rest.to_vec()));
        }
    }
    Ok(TreewalkValue::None)
}

fn repr(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "__repr__", 1, 1, &[]).raise(interpreter)?;
    Ok(TreewalkValue::Str(args.get_arg(0).repr()))
}

fn to_str(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "__str__", 1, 1, &[]).raise(interpreter)?;
    let receiver = args.get_arg(0);
    if interpreter.class_of(&receiver).is_exception() {
        return Ok(TreewalkValue::Str(receiver.to_string()));
    }
    interpreter.repr(&receiver).map(TreewalkValue::Str)
}

fn eq(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "__eq__", 2, 2, &[]).raise(interpreter)?;
    Ok(TreewalkValue::Bool(is_same(&args.get_arg(0), &args.get_arg(1))))
}

fn ne(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "__ne__", 2, 2, &[]).raise(interpreter)?;
    Ok(TreewalkValue::Bool(!is_same(&args.get_arg(0), &args.get_arg(1))))
}

fn hash(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "__hash__", 1, 1, &[]).raise(interpreter)?;
    Ok(TreewalkValue::Int(args.get_arg(0).identity() as i64))
}

/// Store directly in the instance namespace, bypassing any `__setattr__` override.
fn setattr(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "__setattr__", 3, 3, &[]).raise(interpreter)?;
    let name = args.get_arg(1).as_str().raise(interpreter)?;
    match args.get_arg(0) {
        TreewalkValue::Object(object) => {
            object.borrow_mut().insert(&name, args.get_arg(2));
            Ok(TreewalkValue::None)
        }
        other => {
            interpreter.set_attr(&other, &name, args.get_arg(2))?;
            Ok(TreewalkValue::None)
        }
    }
}

fn getattribute(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "__getattribute__", 2, 2, &[]).raise(interpreter)?;
    let name = args.get_arg(1).as_str().raise(interpreter)?;
    interpreter.get_attr(&args.get_arg(0), &name)
}
