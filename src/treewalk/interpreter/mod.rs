mod call;
mod display;
mod expr;
mod frame;
mod import;
mod member;
mod names;
mod ops;
mod stmt;

use std::path::PathBuf;

use tracing::debug;

use crate::{
    core::Container,
    domain::Dunder,
    parser::types::{docstring, Ast},
    treewalk::{
        types::{Exception, Module},
        ModuleRegistry, RaisedException, TreewalkResult, TreewalkState,
    },
};

pub use frame::Frame;
pub use ops::is_same;
use frame::Flow;

/// A tree-walking evaluator for the Python subset plugins are written in.
pub struct TreewalkInterpreter {
    pub state: TreewalkState,
}

impl TreewalkInterpreter {
    pub fn new(registry: ModuleRegistry, search_paths: Vec<PathBuf>) -> Self {
        Self {
            state: TreewalkState::new(registry, search_paths),
        }
    }

    /// Attach the current call stack to an exception.
    pub fn raise(&self, exception: Exception) -> RaisedException {
        RaisedException::new(self.state.debug_call_stack(), exception)
    }

    /// Run a module body in the module's own namespace. The module should already be registered
    /// so that imports of it during execution find this instance.
    pub fn execute_module(&self, module: &Container<Module>, ast: &Ast) -> TreewalkResult<()> {
        if let Some(doc) = docstring(ast) {
            module.borrow_mut().insert(&Dunder::Doc, doc.into());
        }

        let (name, path) = {
            let module = module.borrow();
            (module.name().clone(), module.path())
        };
        debug!(module = %name, path = %path.display(), "executing module");

        self.state
            .push_frame("<module>", &path, 1)
            .map_err(|e| self.raise(e))?;
        let result = self.execute_block(ast, &Frame::module(module.clone()));
        self.state.pop_frame();

        result.map(|_: Flow| ())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use crate::treewalk::{test_utils::*, TreewalkValue};

    #[test]
    fn expressions() {
        assert_eval_eq!("1 + 2 * 3", 7i64);
        assert_eval_eq!("7 // 2", 3i64);
        assert_eval_eq!("-7 // 2", -4i64);
        assert_eval_eq!("7 % -3", -2i64);
        assert_eval_eq!("1 < 2 < 3", true);
        assert_eval_eq!("1 < 3 < 2", false);
        assert_eval_eq!("'yes' if 0 else 'no'", "no");
        assert_eval_eq!("[] or 'fallback'", "fallback");
        assert_eval_eq!("'b' in ['a', 'b']", true);
        assert_eval_repr!("[x * x for x in range(5) if x % 2 == 0]", "[0, 4, 16]");
        assert_eval_repr!("{k: len(k) for k in ['a', 'bb']}", "{'a': 1, 'bb': 2}");
        assert_eval_repr!("(1, 'two', None)", "(1, 'two', None)");
        assert_eval_repr!("[1, 2, 3, 4][1:3]", "[2, 3]");
        assert_eval_repr!("'plugin'[::-1]", "'nigulp'");
    }

    #[test]
    fn strings() {
        assert_eval_eq!("', '.join(['a', 'b'])", "a, b");
        assert_eval_eq!("'a=1'.partition('=')[2]", "1");
        assert_eval_eq!("'  Run  '.strip().lower()", "run");
        assert_eval_eq!("'{}-{}'.format(1, 'x')", "1-x");

        let ctx = run(r#"
name = "tool"
width = 3.14159
label = f"{name!r}: {width:.2f} [{name:>6}]"
"#);
        assert_read_eq!(ctx, "label", "'tool': 3.14 [  tool]");
    }

    #[test]
    fn functions_and_arguments() {
        let ctx = run(r#"
def describe(first, second=2, *rest, flag=False, **options):
    return [first, second, list(rest), flag, sorted(options)]

a = describe(1)
b = describe(1, 3, 4, 5, flag=True, z=1, y=2)
square = lambda n: n * n
c = list(map(square, [1, 2, 3]))
"#);
        assert_eq!(read(&ctx, "a").repr(), "[1, 2, [], False, []]");
        assert_eq!(read(&ctx, "b").repr(), "[1, 3, [4, 5], True, ['y', 'z']]");
        assert_eq!(read(&ctx, "c").repr(), "[1, 4, 9]");

        let e = run_expect_error(r#"
def needs(a, b):
    pass

needs(1)
"#);
        assert_error!(e, TypeError, "needs() missing 1 required positional argument: 'b'");
    }

    #[test]
    fn containers() {
        let ctx = run(r#"
options = {'a': 1}
options.update(b=2)
options.update({'c': 3}, d=4)

items = [1]
items.append(items)
table = {}
table['self'] = table

class Node:
    def __init__(self):
        self.children = []
        self.children.append(self.children)

    def __repr__(self):
        return f"Node({self.children!r})"

a = repr(items)
b = str(table)
c = repr([items, table])
d = repr(Node())
"#);
        assert_eq!(read(&ctx, "options").repr(), "{'a': 1, 'b': 2, 'c': 3, 'd': 4}");
        assert_read_eq!(ctx, "a", "[1, [...]]");
        assert_read_eq!(ctx, "b", "{'self': {...}}");
        assert_read_eq!(ctx, "c", "[[1, [...]], {'self': {...}}]");
        assert_read_eq!(ctx, "d", "Node([[...]])");
    }

    #[test]
    fn closures_and_scopes() {
        let ctx = run(r#"
total = 0

def counter():
    count = 0
    def bump():
        nonlocal count
        count += 1
        return count
    return bump

def add(n):
    global total
    total += n

bump = counter()
bump()
a = bump()
add(5)
add(2)
"#);
        assert_read_eq!(ctx, "a", 2i64);
        assert_read_eq!(ctx, "total", 7i64);

        let e = run_expect_error("print(undefined_name)");
        assert_error!(e, NameError, "name 'undefined_name' is not defined");
    }

    #[test]
    fn classes() {
        let ctx = run(r#"
class Shape:
    sides = 0

    def __init__(self, name):
        self.name = name

    def describe(self):
        return f"{self.name} has {self.sides} sides"

    @property
    def label(self):
        return self.name.upper()

    @classmethod
    def unit(cls):
        return cls("unit")

class Square(Shape):
    sides = 4

    def describe(self):
        return "square: " + super().describe()

square = Square("box")
a = square.describe()
b = square.label
c = Square.unit().describe()
d = isinstance(square, Shape)
e = issubclass(Shape, Square)
f = type(square).__name__
"#);
        assert_read_eq!(ctx, "a", "square: box has 4 sides");
        assert_read_eq!(ctx, "b", "BOX");
        assert_read_eq!(ctx, "c", "square: unit has 4 sides");
        assert_read_eq!(ctx, "d", true);
        assert_read_eq!(ctx, "e", false);
        assert_read_eq!(ctx, "f", "Square");

        let e = run_expect_error(r#"
class Point:
    pass

Point().z
"#);
        assert_error!(e, AttributeError, "'Point' object has no attribute 'z'");
    }

    #[test]
    fn exceptions() {
        let ctx = run(r#"
class PluginError(ValueError):
    pass

events = []
try:
    try:
        raise PluginError("bad input")
    finally:
        events.append("finally")
except ValueError as e:
    events.append(str(e))
else:
    events.append("else")

try:
    {}["missing"]
except (TypeError, LookupError):
    events.append("lookup")
"#);
        assert_eq!(read(&ctx, "events").repr(), "['finally', 'bad input', 'lookup']");

        let e = run_expect_error(r#"
def check(value):
    assert value > 0, "must be positive"

check(-1)
"#);
        assert_error!(e, AssertionError, "must be positive");

        let e = run_expect_error(r#"
try:
    1 / 0
except ZeroDivisionError:
    raise
"#);
        assert_error!(e, ZeroDivisionError);
    }

    #[test]
    fn runaway_recursion() {
        // The size of a spawned thread's default stack.
        let outcome = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(|| {
                let e = run_expect_error(r#"
def forever(n):
    return forever(n + 1)

forever(0)
"#);
                let ctx = run(r#"
def forever(n):
    return forever(n + 1)

try:
    forever(0)
except RecursionError:
    caught = True
"#);
                (e.exception.get_type(), e.exception.message(), read(&ctx, "caught").repr())
            })
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(
            outcome,
            (
                crate::domain::Type::RecursionError,
                "maximum recursion depth exceeded".to_string(),
                "True".to_string()
            )
        );
    }

    #[test]
    fn recursion_within_the_limit() {
        let ctx = run(r#"
def depth(n):
    return 0 if n == 0 else 1 + depth(n - 1)

a = depth(20)
"#);
        assert_read_eq!(ctx, "a", 20i64);
    }

    #[test]
    fn imports_from_the_search_path() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("shapes")).unwrap();
        fs::write(dir.path().join("shapes/__init__.py"), "from .circle import area\n").unwrap();
        fs::write(
            dir.path().join("shapes/circle.py"),
            "import math\n\ndef area(r):\n    return round(math.pi * r * r, 2)\n",
        )
        .unwrap();

        let ctx = run_in(
            dir.path(),
            r#"
import shapes.circle
from shapes import area

a = area(1)
b = shapes.circle.area is area
"#,
        );
        assert_read_eq!(ctx, "a", 3.14);
        assert_read_eq!(ctx, "b", true);
        assert!(ctx.interpreter.state.registry().contains(
            &crate::domain::ModuleName::from_dotted("shapes.circle").unwrap()
        ));

        let e = run_in_expect_error(dir.path(), "from shapes import volume");
        assert_error!(e, ImportError);
        let e = run_in_expect_error(dir.path(), "import not_a_module");
        assert_error!(e, ModuleNotFoundError, "No module named 'not_a_module'");
    }

    #[test]
    fn module_docstring() {
        let ctx = run(r#"
"""Tools for tests."""

x = 1
"#);
        assert_eq!(
            read(&ctx, "__doc__"),
            TreewalkValue::from("Tools for tests.")
        );
    }
}
