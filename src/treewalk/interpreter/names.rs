use crate::{
    parser::types::Expr,
    treewalk::{
        interpreter::frame::FrameKind, types::Exception, Frame, Raise, TreewalkInterpreter,
        TreewalkResult, TreewalkValue,
    },
};

impl TreewalkInterpreter {
    /// Resolve a name: locals, enclosing functions, the module, then builtins.
    pub(super) fn load_name(&self, name: &str, frame: &Frame) -> TreewalkResult<TreewalkValue> {
        let found = match (&frame.kind, &frame.local) {
            (FrameKind::Function, Some(local)) => {
                let local = local.borrow();
                if local.has_global(name) {
                    self.load_global(name, frame)
                } else if local.has_nonlocal(name) {
                    frame.enclosing.as_ref().and_then(|env| env.borrow().read(name))
                } else {
                    local
                        .get(name)
                        .or_else(|| frame.enclosing.as_ref().and_then(|env| env.borrow().read(name)))
                        .or_else(|| self.load_global(name, frame))
                }
            }
            (FrameKind::Class, Some(local)) => local
                .borrow()
                .get(name)
                .or_else(|| frame.enclosing.as_ref().and_then(|env| env.borrow().read(name)))
                .or_else(|| self.load_global(name, frame)),
            _ => self.load_global(name, frame),
        };

        match found {
            Some(value) => Ok(value),
            None => Exception::name_error(name).raise(self),
        }
    }

    fn load_global(&self, name: &str, frame: &Frame) -> Option<TreewalkValue> {
        frame
            .module
            .borrow()
            .get(name)
            .or_else(|| self.state.builtin(name))
    }

    pub(super) fn store_name(
        &self,
        name: &str,
        value: TreewalkValue,
        frame: &Frame,
    ) -> TreewalkResult<()> {
        match (&frame.kind, &frame.local) {
            (FrameKind::Function, Some(local)) => {
                if local.borrow().has_global(name) {
                    frame.module.borrow_mut().insert(name, value);
                } else if local.borrow().has_nonlocal(name) {
                    let written = frame
                        .enclosing
                        .as_ref()
                        .is_some_and(|env| env.borrow().write(name, value));
                    if !written {
                        return Exception::syntax_error(format!(
                            "no binding for nonlocal '{name}' found"
                        ))
                        .raise(self);
                    }
                } else {
                    local.borrow_mut().insert(name, value);
                }
            }
            (_, Some(local)) => {
                local.borrow_mut().insert(name, value);
            }
            (_, None) => frame.module.borrow_mut().insert(name, value),
        }
        Ok(())
    }

    pub(super) fn delete_name(&self, name: &str, frame: &Frame) -> TreewalkResult<()> {
        match self.unbind_name(name, frame) {
            Some(_) => Ok(()),
            None => Exception::name_error(name).raise(self),
        }
    }

    /// Remove a binding from the frame's own namespace, if present.
    pub(super) fn unbind_name(&self, name: &str, frame: &Frame) -> Option<TreewalkValue> {
        match &frame.local {
            Some(local) if !local.borrow().has_global(name) => local.borrow_mut().delete(name),
            _ => frame.module.borrow_mut().delete(name),
        }
    }

    /// A binding in the frame's own namespace only.
    pub(super) fn lookup_local(&self, name: &str, frame: &Frame) -> Option<TreewalkValue> {
        match &frame.local {
            Some(local) => local.borrow().get(name),
            None => frame.module.borrow().get(name),
        }
    }

    /// Bind `value` to an assignment target, unpacking into tuple and list targets.
    pub(super) fn assign(
        &self,
        target: &Expr,
        value: TreewalkValue,
        frame: &Frame,
    ) -> TreewalkResult<()> {
        match target {
            Expr::Variable(name) => self.store_name(name, value, frame),
            Expr::MemberAccess { object, field } => {
                let object = self.evaluate_expr(object, frame)?;
                self.set_attr(&object, field, value)
            }
            Expr::IndexAccess { object, index } => {
                let object = self.evaluate_expr(object, frame)?;
                let index = self.evaluate_expr(index, frame)?;
                self.set_item(&object, index, value)
            }
            Expr::Tuple(targets) | Expr::List(targets) => self.unpack(targets, value, frame),
            Expr::Starred(_) => {
                Exception::syntax_error("starred assignment target must be in a list or tuple")
                    .raise(self)
            }
            _ => Exception::syntax_error("cannot assign to expression").raise(self),
        }
    }

    fn unpack(&self, targets: &[Expr], value: TreewalkValue, frame: &Frame) -> TreewalkResult<()> {
        let items = self.iterate(&value)?;
        let starred = targets.iter().position(|t| matches!(t, Expr::Starred(_)));

        let Some(star) = starred else {
            if items.len() > targets.len() {
                return Exception::value_error(format!(
                    "too many values to unpack (expected {})",
                    targets.len()
                ))
                .raise(self);
            }
            if items.len() < targets.len() {
                return Exception::value_error(format!(
                    "not enough values to unpack (expected {}, got {})",
                    targets.len(),
                    items.len()
                ))
                .raise(self);
            }
            for (target, item) in targets.iter().zip(items) {
                self.assign(target, item, frame)?;
            }
            return Ok(());
        };

        let required = targets.len() - 1;
        if items.len() < required {
            return Exception::value_error(format!(
                "not enough values to unpack (expected at least {required}, got {})",
                items.len()
            ))
            .raise(self);
        }

        let after = targets.len() - star - 1;
        let middle_end = items.len() - after;
        let mut items = items.into_iter();
        for target in &targets[..star] {
            if let Some(item) = items.next() {
                self.assign(target, item, frame)?;
            }
        }
        let middle: Vec<_> = items.by_ref().take(middle_end - star).collect();
        if let Expr::Starred(inner) = &targets[star] {
            self.assign(inner, TreewalkValue::new_list(middle), frame)?;
        }
        for (target, item) in targets[star + 1..].iter().zip(items) {
            self.assign(target, item, frame)?;
        }
        Ok(())
    }
}
