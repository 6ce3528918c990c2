use std::rc::Rc;

use crate::{
    core::Container,
    domain::{Dunder, Type},
    parser::types::{
        docstring, Ast, BinOp, ClassDef, ExceptHandler, Expr, FunctionDef, RaiseKind, Statement,
        StatementKind,
    },
    treewalk::{
        interpreter::frame::{Flow, FrameKind},
        types::{Class, Dict, Exception, Function, Object, UnionType},
        utils::args,
        Frame, Raise, RaisedException, Scope, TreewalkInterpreter, TreewalkResult,
        TreewalkValue,
    },
};

impl TreewalkInterpreter {
    pub(super) fn execute_block(&self, ast: &Ast, frame: &Frame) -> TreewalkResult<Flow> {
        for stmt in ast {
            self.state.set_line(stmt.line);
            match self.execute_statement(stmt, frame)? {
                Flow::Next => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Next)
    }

    fn execute_statement(&self, stmt: &Statement, frame: &Frame) -> TreewalkResult<Flow> {
        match &stmt.kind {
            StatementKind::Expression(expr) => {
                self.evaluate_expr(expr, frame)?;
            }
            StatementKind::Assignment { targets, value } => {
                let value = self.evaluate_expr(value, frame)?;
                for target in targets {
                    self.assign(target, value.clone(), frame)?;
                }
            }
            StatementKind::AnnotatedAssignment {
                target,
                annotation,
                value,
            } => self.execute_annotated_assignment(target, annotation, value.as_ref(), frame)?,
            StatementKind::CompoundAssignment {
                operator,
                target,
                value,
            } => self.execute_compound_assignment(operator, target, value, frame)?,
            StatementKind::FunctionDef(def) => {
                let function = self.define_function(def, stmt.line, frame)?;
                self.store_name(&def.name, function, frame)?;
            }
            StatementKind::ClassDef(def) => {
                let class = self.define_class(def, frame)?;
                self.store_name(&def.name, class, frame)?;
            }
            StatementKind::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.evaluate_expr(expr, frame)?,
                    None => TreewalkValue::None,
                };
                return Ok(Flow::Return(value));
            }
            StatementKind::IfElse {
                if_part,
                elif_parts,
                else_part,
            } => {
                for branch in std::iter::once(if_part).chain(elif_parts) {
                    let condition = self.evaluate_expr(&branch.condition, frame)?;
                    if self.truthy(&condition)? {
                        return self.execute_block(&branch.ast, frame);
                    }
                }
                if let Some(else_part) = else_part {
                    return self.execute_block(else_part, frame);
                }
            }
            StatementKind::WhileLoop {
                condition,
                body,
                else_block,
            } => {
                loop {
                    let value = self.evaluate_expr(condition, frame)?;
                    if !self.truthy(&value)? {
                        break;
                    }
                    match self.execute_block(body, frame)? {
                        Flow::Break => return Ok(Flow::Next),
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Next | Flow::Continue => {}
                    }
                }
                if let Some(else_block) = else_block {
                    return self.execute_block(else_block, frame);
                }
            }
            StatementKind::ForInLoop {
                target,
                iterable,
                body,
                else_block,
            } => {
                let iterable = self.evaluate_expr(iterable, frame)?;
                for item in self.iterate(&iterable)? {
                    self.assign(target, item, frame)?;
                    match self.execute_block(body, frame)? {
                        Flow::Break => return Ok(Flow::Next),
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Next | Flow::Continue => {}
                    }
                }
                if let Some(else_block) = else_block {
                    return self.execute_block(else_block, frame);
                }
            }
            StatementKind::Break => return Ok(Flow::Break),
            StatementKind::Continue => return Ok(Flow::Continue),
            StatementKind::Pass => {}
            StatementKind::RegularImport(items) => self.execute_regular_import(items, frame)?,
            StatementKind::SelectiveImport { import_path, mode } => {
                self.execute_selective_import(import_path, mode, frame)?
            }
            StatementKind::Global(names) => {
                if let (FrameKind::Function, Some(local)) = (frame.kind, &frame.local) {
                    for name in names {
                        local.borrow_mut().mark_global(name);
                    }
                }
            }
            StatementKind::Nonlocal(names) => {
                let (FrameKind::Function, Some(local)) = (frame.kind, &frame.local) else {
                    return Exception::syntax_error("nonlocal declaration not allowed at module level")
                        .raise(self);
                };
                for name in names {
                    let bound = frame
                        .enclosing
                        .as_ref()
                        .is_some_and(|env| env.borrow().binds(name));
                    if !bound {
                        return Exception::syntax_error(format!(
                            "no binding for nonlocal '{name}' found"
                        ))
                        .raise(self);
                    }
                    local.borrow_mut().mark_nonlocal(name);
                }
            }
            StatementKind::Raise(kind) => return Err(self.execute_raise(kind, frame)?),
            StatementKind::TryExcept {
                try_block,
                handlers,
                else_block,
                finally_block,
            } => {
                return self.execute_try(
                    try_block,
                    handlers,
                    else_block.as_ref(),
                    finally_block.as_ref(),
                    frame,
                )
            }
            StatementKind::Assert { condition, message } => {
                let value = self.evaluate_expr(condition, frame)?;
                if !self.truthy(&value)? {
                    let message = match message {
                        Some(message) => Some(self.evaluate_expr(message, frame)?),
                        None => None,
                    };
                    return Exception::assertion_error(message).raise(self);
                }
            }
            StatementKind::Delete(targets) => {
                for target in targets {
                    self.delete_target(target, frame)?;
                }
            }
        }

        Ok(Flow::Next)
    }

    fn execute_annotated_assignment(
        &self,
        target: &Expr,
        annotation: &Expr,
        value: Option<&Expr>,
        frame: &Frame,
    ) -> TreewalkResult<()> {
        // Annotations on local variables are never evaluated.
        if let (Some(name), false) = (target.as_variable(), frame.kind == FrameKind::Function) {
            let annotation = self.evaluate_annotation(annotation, frame)?;
            let annotations = match self.lookup_local(&Dunder::Annotations, frame) {
                Some(TreewalkValue::Dict(dict)) => dict,
                _ => {
                    let dict = Container::new(Dict::default());
                    self.store_name(&Dunder::Annotations, TreewalkValue::Dict(dict.clone()), frame)?;
                    dict
                }
            };
            annotations
                .borrow_mut()
                .insert(TreewalkValue::Str(name.to_string()), annotation)
                .raise(self)?;
        }

        if let Some(value) = value {
            let value = self.evaluate_expr(value, frame)?;
            self.assign(target, value, frame)?;
        }
        Ok(())
    }

    fn execute_compound_assignment(
        &self,
        operator: &BinOp,
        target: &Expr,
        value: &Expr,
        frame: &Frame,
    ) -> TreewalkResult<()> {
        let current = self.evaluate_expr(target, frame)?;
        let operand = self.evaluate_expr(value, frame)?;

        // `+=` on a list extends it in place, so aliases observe the change.
        let result = match (operator, &current) {
            (BinOp::Add, TreewalkValue::List(list)) => {
                let items = self.iterate(&operand)?;
                list.borrow_mut().extend(items);
                current.clone()
            }
            (BinOp::BitwiseOr, TreewalkValue::Dict(dict)) => match &operand {
                TreewalkValue::Dict(other) => {
                    let other = other.borrow().clone();
                    dict.borrow_mut().extend(&other).raise(self)?;
                    current.clone()
                }
                _ => self.binary_op(operator, current.clone(), operand)?,
            },
            _ => self.binary_op(operator, current.clone(), operand)?,
        };
        self.assign(target, result, frame)
    }

    pub(super) fn define_function(
        &self,
        def: &FunctionDef,
        line: usize,
        frame: &Frame,
    ) -> TreewalkResult<TreewalkValue> {
        let decorators = def
            .decorators
            .iter()
            .map(|d| self.evaluate_expr(d, frame))
            .collect::<TreewalkResult<Vec<_>>>()?;

        let signature = self.evaluate_signature(&def.params, def.returns.as_ref(), frame)?;
        let function = Function {
            name: def.name.to_string(),
            qualname: frame.qualify(&def.name),
            module: frame.module_name(),
            signature,
            body: Rc::clone(&def.body),
            line,
            globals: frame.module.clone(),
            closure: frame.closure(),
            defining_class: None,
            doc: docstring(&def.body).map(|d| d.to_string()),
            attrs: Scope::default(),
        };

        let mut value = TreewalkValue::Function(Container::new(function));
        for decorator in decorators.iter().rev() {
            value = self.call(decorator, args![value])?;
        }
        Ok(value)
    }

    fn define_class(&self, def: &ClassDef, frame: &Frame) -> TreewalkResult<TreewalkValue> {
        let decorators = def
            .decorators
            .iter()
            .map(|d| self.evaluate_expr(d, frame))
            .collect::<TreewalkResult<Vec<_>>>()?;

        let mut bases = vec![];
        for base in &def.bases {
            let value = self.evaluate_expr(base, frame)?;
            bases.push(self.class_base(value)?);
        }
        if bases.is_empty() {
            bases.push(self.state.class(Type::Object));
        }

        let qualname = frame.qualify(&def.name);
        let module_name = frame.module_name();
        let mut namespace = Scope::default();
        namespace.insert(&Dunder::Module, TreewalkValue::Str(module_name.clone()));
        namespace.insert(&Dunder::Qualname, TreewalkValue::Str(qualname.clone()));
        namespace.insert(
            &Dunder::Doc,
            docstring(&def.body).map_or(TreewalkValue::None, TreewalkValue::from),
        );
        let namespace = Container::new(namespace);

        let body_frame = frame.class_body(namespace.clone(), &qualname);
        self.execute_block(&def.body, &body_frame)?;

        let namespace = namespace.borrow().clone();
        let class = Class::new_user(&def.name, &qualname, &module_name, bases, namespace)
            .raise(self)?;
        let class = Container::new(class);
        for (_, member) in class.borrow().scope().iter() {
            bind_defining_class(member, &class);
        }

        let mut value = TreewalkValue::Class(class);
        for decorator in decorators.iter().rev() {
            value = self.call(decorator, args![value])?;
        }
        Ok(value)
    }

    /// Validate one entry of a class statement's base list.
    fn class_base(&self, value: TreewalkValue) -> TreewalkResult<Container<Class>> {
        let class = match value {
            TreewalkValue::Class(class) => class,
            // `class Box(Generic[T])` subclasses the origin.
            TreewalkValue::GenericAlias(alias) => match *alias.origin {
                TreewalkValue::Class(class) => class,
                other => return self.class_base(other),
            },
            other => {
                return Exception::type_error(format!(
                    "bases must be types, not '{}'",
                    other.type_name()
                ))
                .raise(self)
            }
        };

        if let Some(builtin) = class.borrow().builtin() {
            if !builtin.is_subclassable() {
                return Exception::type_error(format!(
                    "type '{builtin}' is not an acceptable base type"
                ))
                .raise(self);
            }
        }
        Ok(class)
    }

    fn execute_raise(&self, kind: &RaiseKind, frame: &Frame) -> TreewalkResult<RaisedException> {
        let (exception, cause) = match kind {
            RaiseKind::Reraise => {
                return match self.state.current_handling() {
                    Some(raised) => Ok(raised),
                    None => Exception::runtime_error("No active exception to reraise").raise(self),
                }
            }
            RaiseKind::Raise(expr) => (self.evaluate_expr(expr, frame)?, None),
            RaiseKind::RaiseFrom { exception, cause } => (
                self.evaluate_expr(exception, frame)?,
                Some(self.evaluate_expr(cause, frame)?),
            ),
        };

        let exception = self.exception_from_value(exception)?;
        if let (Some(cause), Some(instance)) = (cause, &exception.instance) {
            let cause = match cause {
                TreewalkValue::Class(_) => TreewalkValue::Object(
                    self.exception_object(&self.exception_from_value(cause)?),
                ),
                other => other,
            };
            instance.borrow_mut().insert("__cause__", cause);
        }
        Ok(self.raise(exception))
    }

    /// Turn the operand of `raise` into an exception: classes are instantiated, instances are
    /// raised as they are.
    pub(super) fn exception_from_value(&self, value: TreewalkValue) -> TreewalkResult<Exception> {
        let value = match value {
            TreewalkValue::Class(class) if class.is_exception() => {
                self.instantiate(&class, args![])?
            }
            other => other,
        };

        if let TreewalkValue::Object(object) = &value {
            let kind = object.borrow().class().exception_type();
            if let Some(kind) = kind {
                let payload = match object.borrow().get("args") {
                    Some(TreewalkValue::Tuple(args)) => args.to_vec(),
                    _ => vec![],
                };
                return Ok(Exception::from_instance(kind, payload, object.clone()));
            }
        }

        Exception::type_error("exceptions must derive from BaseException").raise(self)
    }

    /// The Python-visible instance for an exception, creating one for errors raised by the
    /// interpreter itself.
    pub fn exception_object(&self, exception: &Exception) -> Container<Object> {
        if let Some(instance) = &exception.instance {
            return instance.clone();
        }
        let mut object = Object::new(self.state.class(exception.kind));
        object.insert("args", TreewalkValue::new_tuple(exception.payload.clone()));
        Container::new(object)
    }

    fn execute_try(
        &self,
        try_block: &Ast,
        handlers: &[ExceptHandler],
        else_block: Option<&Ast>,
        finally_block: Option<&Ast>,
        frame: &Frame,
    ) -> TreewalkResult<Flow> {
        let outcome = match self.execute_block(try_block, frame) {
            Ok(Flow::Next) => match else_block {
                Some(else_block) => self.execute_block(else_block, frame),
                None => Ok(Flow::Next),
            },
            Ok(flow) => Ok(flow),
            Err(raised) => self.handle_exception(raised, handlers, frame),
        };

        match finally_block {
            Some(finally_block) => match self.execute_block(finally_block, frame)? {
                Flow::Next => outcome,
                // A `return` or `break` in `finally` discards any pending exception.
                flow => Ok(flow),
            },
            None => outcome,
        }
    }

    fn handle_exception(
        &self,
        raised: RaisedException,
        handlers: &[ExceptHandler],
        frame: &Frame,
    ) -> TreewalkResult<Flow> {
        for handler in handlers {
            if let Some(expr) = &handler.exception_type {
                let expected = self.evaluate_expr(expr, frame)?;
                if !self.exception_matches(&raised.exception, &expected)? {
                    continue;
                }
            }

            let instance = self.exception_object(&raised.exception);
            let raised = RaisedException::new(
                raised.debug_call_stack,
                Exception::from_instance(
                    raised.exception.kind,
                    raised.exception.payload,
                    instance.clone(),
                ),
            );

            if let Some(alias) = &handler.alias {
                self.store_name(alias, TreewalkValue::Object(instance), frame)?;
            }

            self.state.push_handling(raised);
            let result = self.execute_block(&handler.block, frame);
            self.state.pop_handling();

            if let Some(alias) = &handler.alias {
                self.unbind_name(alias, frame);
            }
            return result;
        }

        Err(raised)
    }

    pub(super) fn exception_matches(
        &self,
        exception: &Exception,
        expected: &TreewalkValue,
    ) -> TreewalkResult<bool> {
        match expected {
            TreewalkValue::Tuple(options) => {
                for option in options.iter() {
                    if self.exception_matches(exception, option)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            TreewalkValue::Union(UnionType { members }) => {
                for member in members {
                    if self.exception_matches(exception, member)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            TreewalkValue::Class(class) if class.is_exception() => Ok(match &exception.instance {
                Some(instance) => instance.borrow().class().is_subclass_of(class),
                None => match class.borrow().builtin() {
                    Some(expected) => {
                        std::iter::successors(Some(exception.kind), |t| t.parent())
                            .any(|t| t == expected)
                    }
                    None => false,
                },
            }),
            _ => Exception::type_error_must_inherit_base_exception().raise(self),
        }
    }

    fn delete_target(&self, target: &Expr, frame: &Frame) -> TreewalkResult<()> {
        match target {
            Expr::Variable(name) => self.delete_name(name, frame),
            Expr::Tuple(items) | Expr::List(items) => {
                for item in items {
                    self.delete_target(item, frame)?;
                }
                Ok(())
            }
            Expr::MemberAccess { object, field } => {
                let object = self.evaluate_expr(object, frame)?;
                self.delete_attr(&object, field)
            }
            Expr::IndexAccess { object, index } => {
                let object = self.evaluate_expr(object, frame)?;
                let index = self.evaluate_expr(index, frame)?;
                self.delete_item(&object, &index)
            }
            _ => Exception::syntax_error("cannot delete expression").raise(self),
        }
    }
}

fn bind_defining_class(member: &TreewalkValue, class: &Container<Class>) {
    match member {
        TreewalkValue::Function(function) => {
            function.borrow_mut().defining_class = Some(class.downgrade());
        }
        TreewalkValue::Staticmethod(s) => bind_defining_class(&s.func, class),
        TreewalkValue::Classmethod(c) => bind_defining_class(&c.func, class),
        TreewalkValue::Property(p) => {
            bind_defining_class(&p.fget, class);
            if let Some(fset) = &p.fset {
                bind_defining_class(fset, class);
            }
        }
        _ => {}
    }
}
