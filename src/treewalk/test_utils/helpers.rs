use std::path::{Path, PathBuf};

use crate::{
    core::Container,
    domain::{ModuleName, ModuleOrigin, Text},
    parser::Parser,
    treewalk::{
        types::Module, ModuleRegistry, RaisedException, TreewalkInterpreter, TreewalkResult,
        TreewalkValue,
    },
};

/// An interpreter together with the `__main__` module a test ran in.
pub struct TestContext {
    pub interpreter: TreewalkInterpreter,
    pub module: Container<Module>,
}

fn execute(text: &str, search_paths: Vec<PathBuf>) -> (TestContext, TreewalkResult<()>) {
    let ast = Parser::parse_text(&Text::new(text.trim())).expect("Failed to parse test string");
    let interpreter = TreewalkInterpreter::new(ModuleRegistry::new(), search_paths);
    let name = ModuleName::from_static("__main__");
    let module = Container::new(Module::new(name, None, ModuleOrigin::Synthetic));
    interpreter.state.registry().insert(module.clone());
    let result = interpreter.execute_module(&module, &ast);
    (
        TestContext {
            interpreter,
            module,
        },
        result,
    )
}

pub fn run(text: &str) -> TestContext {
    let (context, result) = execute(text, vec![]);
    if let Err(e) = result {
        panic!("Treewalk run failed: {e}");
    }
    context
}

/// Run with `dir` on the import search path.
pub fn run_in(dir: &Path, text: &str) -> TestContext {
    let (context, result) = execute(text, vec![dir.to_path_buf()]);
    if let Err(e) = result {
        panic!("Treewalk run failed: {e}");
    }
    context
}

pub fn run_expect_error(text: &str) -> RaisedException {
    match execute(text, vec![]).1 {
        Ok(()) => panic!("Expected an error!"),
        Err(e) => e,
    }
}

pub fn run_in_expect_error(dir: &Path, text: &str) -> RaisedException {
    match execute(text, vec![dir.to_path_buf()]).1 {
        Ok(()) => panic!("Expected an error!"),
        Err(e) => e,
    }
}

/// Evaluate a single expression.
pub fn eval(expr: &str) -> TreewalkValue {
    let context = run(&format!("__value__ = {expr}"));
    read(&context, "__value__")
}

pub fn read(context: &TestContext, name: &str) -> TreewalkValue {
    context
        .module
        .borrow()
        .get(name)
        .unwrap_or_else(|| panic!("Failed to read variable '{name}'"))
}

/// `str()` of a module-level variable, as `print` would show it.
pub fn read_str(context: &TestContext, name: &str) -> String {
    let value = read(context, name);
    context
        .interpreter
        .to_str(&value)
        .expect("Failed to convert to str")
}
