//! Modules implemented in Rust. Each interpreter builds its own copy on first import, so
//! `sys.path` always belongs to the interpreter that imported `sys`.

mod future;
mod json;
mod math;
mod os;
mod sys;
mod time;
mod typing;

use tracing::debug;

use crate::{
    core::Container,
    domain::ModuleName,
    treewalk::{
        types::{BuiltinFn, BuiltinFunction, Module},
        TreewalkInterpreter, TreewalkValue,
    },
};

/// Every module name [`load`] can build.
pub const NATIVE_MODULES: [&str; 8] = [
    "__future__",
    "json",
    "math",
    "os",
    "os.path",
    "sys",
    "time",
    "typing",
];

pub fn is_native(name: &str) -> bool {
    NATIVE_MODULES.contains(&name)
}

/// Build the native module `name`, or `None` when it must be found on the search path.
pub fn load(interpreter: &TreewalkInterpreter, name: &ModuleName) -> Option<Container<Module>> {
    let module = match name.as_str().as_str() {
        "__future__" => future::module(),
        "json" => json::module(interpreter),
        "math" => math::module(),
        "os" => os::module(interpreter),
        "os.path" => os::path_module(),
        "sys" => sys::module(interpreter),
        "time" => time::module(),
        "typing" => typing::module(interpreter),
        _ => return None,
    };
    debug!(module = %name, "created native module");
    Some(Container::new(module))
}

/// A native module exposing `functions`.
fn new_module(name: &'static str, functions: &[(&'static str, BuiltinFn)]) -> Module {
    let mut module = Module::new_builtin(ModuleName::from_static(name));
    for &(function, func) in functions {
        module.insert(
            function,
            TreewalkValue::BuiltinFunction(BuiltinFunction::new(function, func)),
        );
    }
    module
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::treewalk::ModuleRegistry;

    #[test]
    fn every_native_module_loads() {
        let interpreter = TreewalkInterpreter::new(ModuleRegistry::new(), vec![]);
        for name in NATIVE_MODULES {
            let module = load(&interpreter, &ModuleName::from_static(name)).unwrap();
            assert_eq!(module.borrow().name().as_str(), name);
        }
        assert!(load(&interpreter, &ModuleName::from_static("requests")).is_none());
    }

    #[test]
    fn native_names() {
        assert!(is_native("typing"));
        assert!(is_native("os.path"));
        assert!(!is_native("collections"));
    }
}
