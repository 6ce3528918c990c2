use crate::treewalk::{
    types::{BuiltinFn, Dict, Exception, Module},
    utils::{check_args, Args},
    Raise, TreewalkInterpreter, TreewalkResult, TreewalkValue,
};

use super::new_module;

const VERSION: (i64, i64, i64) = (3, 12, 0);

static FUNCTIONS: [(&str, BuiltinFn); 2] = [
    ("exit", exit),
    ("getrecursionlimit", getrecursionlimit),
];

/// `sys.path` is the interpreter's live search path: appending to it affects later imports.
/// `sys.modules` is a snapshot of the registry taken when `sys` is first imported.
pub(super) fn module(interpreter: &TreewalkInterpreter) -> Module {
    let mut module = new_module("sys", &FUNCTIONS);
    module.insert("path", TreewalkValue::List(interpreter.state.sys_path()));

    let mut modules = Dict::default();
    let registry = interpreter.state.registry();
    for name in registry.names() {
        if let Some(loaded) = registry.get(&name) {
            // String keys are always hashable.
            let _ = modules.insert(TreewalkValue::Str(name.as_str()), TreewalkValue::Module(loaded));
        }
    }
    module.insert("modules", TreewalkValue::new_dict(modules));

    let (major, minor, micro) = VERSION;
    module.insert(
        "version",
        TreewalkValue::Str(format!("{major}.{minor}.{micro} (modwrap)")),
    );
    module.insert(
        "version_info",
        TreewalkValue::new_tuple(vec![
            TreewalkValue::Int(major),
            TreewalkValue::Int(minor),
            TreewalkValue::Int(micro),
        ]),
    );
    module.insert("platform", TreewalkValue::str(std::env::consts::OS));
    module.insert("maxsize", TreewalkValue::Int(i64::MAX));
    module.insert("argv", TreewalkValue::new_list(vec![]));
    module
}

fn getrecursionlimit(
    interpreter: &TreewalkInterpreter,
    args: Args,
) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "getrecursionlimit", 0, 0, &[]).raise(interpreter)?;
    Ok(TreewalkValue::Int(interpreter.state.max_call_depth() as i64))
}

/// Plugins cannot end the host process; `sys.exit()` surfaces as an error instead.
fn exit(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "exit", 0, 1, &[]).raise(interpreter)?;
    let status = match args.get_arg_opt(0) {
        Some(status) => interpreter.to_str(&status)?,
        None => "None".to_string(),
    };
    Exception::runtime_error(format!("sys.exit({status}) called by plugin code")).raise(interpreter)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    use crate::treewalk::ModuleRegistry;

    #[test]
    fn path_is_shared_with_the_interpreter() {
        let interpreter =
            TreewalkInterpreter::new(ModuleRegistry::new(), vec![PathBuf::from("/plugins")]);
        let sys = module(&interpreter);
        let Some(TreewalkValue::List(path)) = sys.get("path") else {
            panic!("sys.path is not a list");
        };
        path.borrow_mut().append(TreewalkValue::str("/extra"));
        assert_eq!(
            interpreter.state.search_paths(),
            vec![PathBuf::from("/plugins"), PathBuf::from("/extra")]
        );
    }
}
