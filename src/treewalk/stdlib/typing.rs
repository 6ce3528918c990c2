use crate::{
    core::Container,
    domain::Type,
    treewalk::{
        types::{BuiltinFn, Class, Module, SpecialForm},
        utils::{check_args, Args},
        Raise, Scope, TreewalkInterpreter, TreewalkResult, TreewalkValue,
    },
};

use super::new_module;

/// Names that only carry meaning inside annotations. Subscripting them builds a generic alias
/// (`Union` builds a union) that renders back to its source spelling.
const SPECIAL_FORMS: [&str; 20] = [
    "Annotated",
    "Any",
    "AnyStr",
    "Awaitable",
    "Callable",
    "ClassVar",
    "Final",
    "FrozenSet",
    "Generator",
    "Iterable",
    "Iterator",
    "Literal",
    "Mapping",
    "MutableMapping",
    "NoReturn",
    "Optional",
    "Self",
    "Sequence",
    "Set",
    "Union",
];

/// Deprecated aliases of builtin classes. `List[str]` renders as `list[str]`.
const ALIASES: [(&str, Type); 4] = [
    ("Dict", Type::Dict),
    ("List", Type::List),
    ("Tuple", Type::Tuple),
    ("Type", Type::Type),
];

/// Classes plugins subclass. They behave as plain empty bases.
const BASE_CLASSES: [&str; 2] = ["Generic", "Protocol"];

static FUNCTIONS: [(&str, BuiltinFn); 5] = [
    ("TypeVar", type_var),
    ("cast", cast),
    ("final", identity),
    ("overload", identity),
    ("runtime_checkable", identity),
];

pub(super) fn module(interpreter: &TreewalkInterpreter) -> Module {
    let mut module = new_module("typing", &FUNCTIONS);
    for form in SPECIAL_FORMS {
        module.insert(form, TreewalkValue::SpecialForm(SpecialForm::new(form)));
    }
    for (alias, builtin) in ALIASES {
        module.insert(alias, TreewalkValue::Class(interpreter.state.class(builtin)));
    }
    let object = interpreter.state.class(Type::Object);
    for name in BASE_CLASSES {
        if let Ok(class) = Class::new_user(name, name, "typing", vec![object.clone()], Scope::default())
        {
            module.insert(name, TreewalkValue::Class(Container::new(class)));
        }
    }
    module.insert("TYPE_CHECKING", TreewalkValue::Bool(false));
    module
}

/// `TypeVar("T", ...)`: the variable renders as its name inside annotations.
fn type_var(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "TypeVar", 1, usize::MAX, &["bound", "covariant", "contravariant"])
        .raise(interpreter)?;
    let name = args.get_arg(0).as_str().raise(interpreter)?;
    Ok(TreewalkValue::SpecialForm(SpecialForm::new(name)))
}

fn cast(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "cast", 2, 2, &[]).raise(interpreter)?;
    Ok(args.get_arg(1))
}

/// Decorators that return their argument unchanged.
fn identity(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "decorator", 1, 1, &[]).raise(interpreter)?;
    Ok(args.get_arg(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::treewalk::{types::render_annotation, ModuleRegistry};

    #[test]
    fn typing_names_render() {
        let interpreter = TreewalkInterpreter::new(ModuleRegistry::new(), vec![]);
        let typing = module(&interpreter);

        let any = typing.get("Any").unwrap();
        assert_eq!(render_annotation(&any), "Any");

        let list = typing.get("List").unwrap();
        assert_eq!(render_annotation(&list), "list");

        let protocol = typing.get("Protocol").unwrap();
        assert_eq!(render_annotation(&protocol), "typing.Protocol");
    }
}
