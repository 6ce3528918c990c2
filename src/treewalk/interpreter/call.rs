use crate::{
    core::Container,
    domain::Dunder,
    treewalk::{
        builtins,
        interpreter::frame::Flow,
        types::{Class, Exception, Function, Object},
        utils::{bind_args, Args},
        Frame, Raise, Scope, TreewalkInterpreter, TreewalkResult, TreewalkValue,
    },
};

impl TreewalkInterpreter {
    /// Call any callable value.
    pub fn call(&self, callee: &TreewalkValue, args: Args) -> TreewalkResult<TreewalkValue> {
        match callee {
            TreewalkValue::Function(function) => self.call_function(function, args),
            TreewalkValue::Method(method) => {
                let (receiver, function) = {
                    let method = method.borrow();
                    (method.receiver().clone(), method.function().clone())
                };
                self.call(&function, args.prepend(receiver))
            }
            TreewalkValue::BuiltinFunction(builtin) => builtin.call(self, args),
            TreewalkValue::Class(class) => self.instantiate(class, args),
            TreewalkValue::Staticmethod(inner) => self.call(&inner.func, args),
            TreewalkValue::Object(object) => {
                let call = object.borrow().class().lookup(&Dunder::Call);
                match call {
                    Some(call) => self.call(&call, args.prepend(callee.clone())),
                    None => {
                        Exception::type_error_not_callable(&callee.type_name()).raise(self)
                    }
                }
            }
            _ => Exception::type_error_not_callable(&callee.type_name()).raise(self),
        }
    }

    fn call_function(
        &self,
        function: &Container<Function>,
        args: Args,
    ) -> TreewalkResult<TreewalkValue> {
        let (name, body, path, line, bindings) = {
            let f = function.borrow();
            let bindings = bind_args(&f.name, &f.signature, args).raise(self)?;
            let path = f.globals.borrow().path();
            (f.name.clone(), f.body.clone(), path, f.line, bindings)
        };

        self.state.push_frame(&name, &path, line).raise(self)?;
        let frame = Frame::function(function, Scope::from_bindings(bindings));
        let result = self.execute_block(&body, &frame);
        self.state.pop_frame();

        match result? {
            Flow::Return(value) => Ok(value),
            _ => Ok(TreewalkValue::None),
        }
    }

    /// Call a class: build an instance and run its `__init__`.
    pub fn instantiate(
        &self,
        class: &Container<Class>,
        args: Args,
    ) -> TreewalkResult<TreewalkValue> {
        let builtin = class.borrow().builtin();
        if let Some(builtin) = builtin {
            if !builtin.is_exception() {
                return builtins::construct(self, builtin, args);
            }
        }

        let is_exception = class.is_exception();
        let mut object = Object::new(class.clone());
        if is_exception {
            object.insert("args", TreewalkValue::new_tuple(args.positional().to_vec()));
        }
        let instance = TreewalkValue::Object(Container::new(object));

        match class.lookup_user(&Dunder::Init) {
            Some(init) => {
                let result = self.call(&init, args.prepend(instance.clone()))?;
                if !result.is_none() {
                    return Exception::type_error(format!(
                        "__init__() should return None, not '{}'",
                        result.type_name()
                    ))
                    .raise(self);
                }
            }
            None if is_exception => {
                if !args.keywords().is_empty() {
                    return Exception::type_error(format!(
                        "{}() takes no keyword arguments",
                        class.borrow().name()
                    ))
                    .raise(self);
                }
            }
            None => {
                if !args.is_empty() {
                    return Exception::type_error(format!(
                        "{}() takes no arguments",
                        class.borrow().name()
                    ))
                    .raise(self);
                }
            }
        }

        Ok(instance)
    }

    /// Call a method looked up on an instance's class, if the class defines it in Python.
    pub fn call_dunder(
        &self,
        receiver: &TreewalkValue,
        name: &str,
        args: Args,
    ) -> TreewalkResult<Option<TreewalkValue>> {
        let TreewalkValue::Object(object) = receiver else {
            return Ok(None);
        };
        let method = object.borrow().class().lookup_user(name);
        match method {
            Some(method) => {
                let bound = self.bind_to_instance(method, receiver)?;
                self.call(&bound, args).map(Some)
            }
            None => Ok(None),
        }
    }

    /// The class of any value, as `type(value)` reports it.
    pub fn class_of(&self, value: &TreewalkValue) -> Container<Class> {
        match value {
            TreewalkValue::Object(object) => object.borrow().class().clone(),
            other => self.state.class(other.get_type()),
        }
    }

    pub fn isinstance(&self, value: &TreewalkValue, class: &Container<Class>) -> bool {
        self.class_of(value).is_subclass_of(class)
    }
}
