use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    path::{Path, PathBuf},
    rc::Rc,
};

use crate::{
    core::Container,
    domain::{DebugCallStack, DebugStackFrame, ModuleName, Type},
    treewalk::{
        builtins,
        types::{Class, Exception, List, Module},
        DomainResult, ModuleRegistry, RaisedException, TreewalkValue,
    },
};

/// Python frames deeper than this raise `RecursionError` instead of exhausting the native stack.
const MAX_CALL_DEPTH: usize = 200;

/// Native stack a chain of Python frames may use, measured from the outermost frame. Unoptimized
/// builds spend far more stack per frame, so on a 2 MiB thread this trips before the depth limit.
const STACK_BUDGET: usize = 1024 * 1024;

/// The builtin classes and the `builtins` namespace. These never change after creation, so one
/// set is shared by every interpreter on a thread and class identity holds across loaders.
pub struct Builtins {
    classes: HashMap<Type, Container<Class>>,
    module: Container<Module>,
}

impl Builtins {
    fn new() -> Self {
        let mut classes: HashMap<Type, Container<Class>> = HashMap::new();
        for builtin in Type::ALL {
            let parent = builtin.parent().and_then(|p| classes.get(&p).cloned());
            classes.insert(builtin, Container::new(Class::new_builtin(builtin, parent)));
        }

        let mut module = Module::new_builtin(ModuleName::from_static("builtins"));
        for builtin in Type::ALL.iter().filter(|t| t.is_exposed()) {
            module.insert(builtin.name(), TreewalkValue::Class(classes[builtin].clone()));
        }
        for function in builtins::functions() {
            module.insert(function.name(), TreewalkValue::BuiltinFunction(function));
        }
        module.insert("Ellipsis", TreewalkValue::Ellipsis);
        module.insert("NotImplemented", TreewalkValue::None);

        Self {
            classes,
            module: Container::new(module),
        }
    }
}

thread_local! {
    static BUILTINS: Rc<Builtins> = Rc::new(Builtins::new());
}

/// Per-interpreter runtime state: the module registry, the import search path, and the Python
/// call stack.
pub struct TreewalkState {
    builtins: Rc<Builtins>,
    registry: ModuleRegistry,
    /// Native modules created by this interpreter. They are kept out of the registry because
    /// `sys` reflects this interpreter's search path.
    native_modules: RefCell<HashMap<ModuleName, Container<Module>>>,
    /// Backs `sys.path`; imports consult it at resolution time.
    sys_path: Container<List>,
    call_stack: RefCell<Vec<DebugStackFrame>>,
    /// Native stack address at the outermost Python frame.
    stack_base: Cell<usize>,
    /// Exceptions whose `except` blocks are currently executing, innermost last.
    handling: RefCell<Vec<RaisedException>>,
    /// Addresses of the lists and dicts whose `repr` is in progress.
    repr_active: RefCell<Vec<usize>>,
}

impl TreewalkState {
    pub fn new(registry: ModuleRegistry, search_paths: Vec<PathBuf>) -> Self {
        let sys_path = search_paths
            .iter()
            .map(|p| TreewalkValue::Str(p.to_string_lossy().into_owned()))
            .collect();
        Self {
            builtins: BUILTINS.with(Rc::clone),
            registry,
            native_modules: RefCell::new(HashMap::new()),
            sys_path: Container::new(List::new(sys_path)),
            call_stack: RefCell::new(vec![]),
            stack_base: Cell::new(0),
            handling: RefCell::new(vec![]),
            repr_active: RefCell::new(vec![]),
        }
    }

    pub fn class(&self, builtin: Type) -> Container<Class> {
        self.builtins.classes[&builtin].clone()
    }

    pub fn builtin(&self, name: &str) -> Option<TreewalkValue> {
        self.builtins.module.borrow().get(name)
    }

    pub fn builtins_module(&self) -> Container<Module> {
        self.builtins.module.clone()
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn native_module(&self, name: &ModuleName) -> Option<Container<Module>> {
        self.native_modules.borrow().get(name).cloned()
    }

    pub fn insert_native_module(&self, module: Container<Module>) {
        let name = module.borrow().name().clone();
        self.native_modules.borrow_mut().insert(name, module);
    }

    pub fn sys_path(&self) -> Container<List> {
        self.sys_path.clone()
    }

    /// The current search path. Entries that are not strings are skipped, as CPython does.
    pub fn search_paths(&self) -> Vec<PathBuf> {
        self.sys_path
            .borrow()
            .iter()
            .filter_map(|entry| match entry {
                TreewalkValue::Str(s) => Some(PathBuf::from(s)),
                _ => None,
            })
            .collect()
    }

    pub fn max_call_depth(&self) -> usize {
        MAX_CALL_DEPTH
    }

    pub fn push_frame(&self, name: &str, path: &Path, line: usize) -> DomainResult<()> {
        let marker = 0u8;
        let here = std::ptr::addr_of!(marker) as usize;

        let mut stack = self.call_stack.borrow_mut();
        if stack.is_empty() {
            self.stack_base.set(here);
        }
        if stack.len() >= MAX_CALL_DEPTH || self.stack_base.get().abs_diff(here) > STACK_BUDGET {
            return Err(Exception::recursion_error());
        }
        stack.push(DebugStackFrame::new(name, path.to_path_buf(), line));
        Ok(())
    }

    pub fn pop_frame(&self) {
        self.call_stack.borrow_mut().pop();
    }

    pub fn set_line(&self, line: usize) {
        if let Some(frame) = self.call_stack.borrow_mut().last_mut() {
            frame.line = line;
        }
    }

    pub fn debug_call_stack(&self) -> DebugCallStack {
        DebugCallStack::new(self.call_stack.borrow().clone())
    }

    /// Mark a container as being rendered. Returns false if it already is.
    pub fn enter_repr(&self, address: usize) -> bool {
        let mut active = self.repr_active.borrow_mut();
        if active.contains(&address) {
            return false;
        }
        active.push(address);
        true
    }

    pub fn leave_repr(&self, address: usize) {
        let mut active = self.repr_active.borrow_mut();
        if let Some(index) = active.iter().rposition(|a| *a == address) {
            active.remove(index);
        }
    }

    pub fn push_handling(&self, raised: RaisedException) {
        self.handling.borrow_mut().push(raised);
    }

    pub fn pop_handling(&self) {
        self.handling.borrow_mut().pop();
    }

    pub fn current_handling(&self) -> Option<RaisedException> {
        self.handling.borrow().last().cloned()
    }
}
