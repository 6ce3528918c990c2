use crate::{
    core::Container,
    domain::{Dunder, Type},
    treewalk::{
        builtins,
        types::{Class, Dict, Exception, Object, Property},
        utils::args,
        Raise, Scope, TreewalkInterpreter, TreewalkResult, TreewalkValue,
    },
};

impl TreewalkInterpreter {
    /// `value.name`, with descriptors bound.
    pub fn get_attr(&self, value: &TreewalkValue, name: &str) -> TreewalkResult<TreewalkValue> {
        match self.find_attr(value, name)? {
            Some(found) => Ok(found),
            None => self.missing_attr(value, name),
        }
    }

    /// Like [`get_attr`](Self::get_attr), but a missing attribute is `None` instead of an error.
    pub fn find_attr(
        &self,
        value: &TreewalkValue,
        name: &str,
    ) -> TreewalkResult<Option<TreewalkValue>> {
        match value {
            TreewalkValue::Object(object) => self.find_instance_attr(value, object, name),
            TreewalkValue::Class(class) => self.find_class_attr(class, name),
            TreewalkValue::Module(module) => Ok(match name {
                "__dict__" => Some(scope_to_dict(module.borrow().scope())),
                _ => module.borrow().get(name),
            }),
            TreewalkValue::Function(function) => {
                let f = function.borrow();
                if let Some(value) = f.attrs.get(name) {
                    return Ok(Some(value));
                }
                Ok(match name {
                    "__name__" => Some(TreewalkValue::str(&f.name)),
                    "__qualname__" => Some(TreewalkValue::str(&f.qualname)),
                    "__module__" => Some(TreewalkValue::str(&f.module)),
                    "__doc__" => Some(f.doc.clone().map_or(TreewalkValue::None, TreewalkValue::Str)),
                    "__annotations__" => {
                        let mut annotations = Dict::default();
                        let params = f
                            .signature
                            .params
                            .iter()
                            .chain(f.signature.args_var.iter())
                            .chain(f.signature.kwonly.iter())
                            .chain(f.signature.kwargs_var.iter());
                        for param in params {
                            if let Some(annotation) = &param.annotation {
                                annotations
                                    .insert(TreewalkValue::str(&param.name), annotation.clone())
                                    .raise(self)?;
                            }
                        }
                        if let Some(returns) = &f.signature.returns {
                            annotations
                                .insert(TreewalkValue::str("return"), returns.clone())
                                .raise(self)?;
                        }
                        Some(TreewalkValue::new_dict(annotations))
                    }
                    "__defaults__" => {
                        let defaults: Vec<_> = f
                            .signature
                            .params
                            .iter()
                            .filter_map(|p| p.default.clone())
                            .collect();
                        Some(if defaults.is_empty() {
                            TreewalkValue::None
                        } else {
                            TreewalkValue::new_tuple(defaults)
                        })
                    }
                    "__dict__" => Some(scope_to_dict(&f.attrs)),
                    _ => None,
                })
            }
            TreewalkValue::Method(method) => {
                let method = method.borrow();
                match name {
                    "__self__" => Ok(Some(method.receiver().clone())),
                    "__func__" => Ok(Some(method.function().clone())),
                    _ => self.find_attr(method.function(), name),
                }
            }
            TreewalkValue::BuiltinFunction(builtin) => Ok(match name {
                "__name__" | "__qualname__" => Some(TreewalkValue::str(builtin.name())),
                "__doc__" => Some(TreewalkValue::None),
                _ => None,
            }),
            TreewalkValue::Super(sup) => self.find_super_attr(&sup.class, &sup.receiver, name),
            TreewalkValue::Property(property) => Ok(match name {
                "fget" => Some(*property.fget.clone()),
                "fset" => Some(property.fset.as_deref().cloned().unwrap_or(TreewalkValue::None)),
                "setter" => Some(TreewalkValue::new_method(
                    value.clone(),
                    TreewalkValue::BuiltinFunction(builtins::PROPERTY_SETTER),
                )),
                _ => None,
            }),
            TreewalkValue::Staticmethod(s) if name == "__func__" => Ok(Some(*s.func.clone())),
            TreewalkValue::Classmethod(c) if name == "__func__" => Ok(Some(*c.func.clone())),
            TreewalkValue::GenericAlias(alias) => Ok(match name {
                "__origin__" => Some(*alias.origin.clone()),
                "__args__" => Some(TreewalkValue::new_tuple(alias.args.clone())),
                _ => None,
            }),
            TreewalkValue::Union(union) => Ok(match name {
                "__args__" => Some(TreewalkValue::new_tuple(union.members.clone())),
                _ => None,
            }),
            TreewalkValue::Range(range) => Ok(match name {
                "start" => Some(TreewalkValue::Int(range.start)),
                "stop" => Some(TreewalkValue::Int(range.stop)),
                "step" => Some(TreewalkValue::Int(range.step)),
                _ => None,
            }),
            _ => {
                if name == Dunder::Class.as_str() {
                    return Ok(Some(TreewalkValue::Class(self.class_of(value))));
                }
                Ok(builtins::type_method(value.get_type(), name)
                    .map(|method| {
                        TreewalkValue::new_method(
                            value.clone(),
                            TreewalkValue::BuiltinFunction(method),
                        )
                    }))
            }
        }
    }

    fn find_instance_attr(
        &self,
        value: &TreewalkValue,
        object: &Container<Object>,
        name: &str,
    ) -> TreewalkResult<Option<TreewalkValue>> {
        let class = object.borrow().class().clone();
        match name {
            "__class__" => return Ok(Some(TreewalkValue::Class(class))),
            "__dict__" => return Ok(Some(scope_to_dict(object.borrow().scope()))),
            _ => {}
        }

        // Data descriptors on the class win over the instance namespace.
        let member = class.lookup(name);
        if let Some(TreewalkValue::Property(property)) = &member {
            return self.call(&property.fget, args![value.clone()]).map(Some);
        }

        if let Some(found) = object.borrow().get(name) {
            return Ok(Some(found));
        }
        if let Some(member) = member {
            return self.bind_to_instance(member, value).map(Some);
        }

        if let Some(method) = builtins::object_method(name) {
            return Ok(Some(TreewalkValue::new_method(
                value.clone(),
                TreewalkValue::BuiltinFunction(method),
            )));
        }
        if class.is_exception() && matches!(name, "__cause__" | "__context__" | "__traceback__") {
            return Ok(Some(TreewalkValue::None));
        }

        if let Some(getattr) = class.lookup_user("__getattr__") {
            let getattr = self.bind_to_instance(getattr, value)?;
            return self.call(&getattr, args![TreewalkValue::str(name)]).map(Some);
        }
        Ok(None)
    }

    fn find_class_attr(
        &self,
        class: &Container<Class>,
        name: &str,
    ) -> TreewalkResult<Option<TreewalkValue>> {
        let special = {
            let c = class.borrow();
            match name {
                "__name__" => Some(TreewalkValue::str(c.name())),
                "__qualname__" => Some(TreewalkValue::str(c.qualname())),
                "__module__" if c.is_builtin() => Some(TreewalkValue::str("builtins")),
                "__doc__" if c.is_builtin() => Some(TreewalkValue::None),
                "__bases__" => Some(TreewalkValue::new_tuple(
                    c.bases().iter().cloned().map(TreewalkValue::Class).collect(),
                )),
                "__dict__" => Some(scope_to_dict(c.scope())),
                _ => None,
            }
        };
        if special.is_some() {
            return Ok(special);
        }
        if name == "__mro__" {
            return Ok(Some(TreewalkValue::new_tuple(
                class.mro().into_iter().map(TreewalkValue::Class).collect(),
            )));
        }

        if let Some(member) = class.lookup(name) {
            return Ok(Some(self.bind_to_class(member, class)));
        }
        if name == Dunder::Class.as_str() {
            return Ok(Some(TreewalkValue::Class(self.state.class(Type::Type))));
        }

        // Unbound builtin methods, e.g. `str.join` or `object.__init__`.
        let builtin = class.nearest_builtin();
        Ok(builtins::type_method(builtin, name)
            .or_else(|| builtins::object_method(name))
            .map(TreewalkValue::BuiltinFunction))
    }

    /// Attribute lookup that starts after `class` in the receiver's MRO.
    fn find_super_attr(
        &self,
        class: &Container<Class>,
        receiver: &TreewalkValue,
        name: &str,
    ) -> TreewalkResult<Option<TreewalkValue>> {
        let owner = match receiver {
            TreewalkValue::Class(cls) => cls.clone(),
            other => self.class_of(other),
        };
        let mro = owner.mro();
        let start = mro
            .iter()
            .position(|c| c.same_identity(class))
            .map_or(mro.len(), |i| i + 1);

        for candidate in &mro[start..] {
            let member = candidate.borrow().get(name);
            if let Some(member) = member {
                return match receiver {
                    TreewalkValue::Class(cls) => Ok(Some(self.bind_to_class(member, cls))),
                    _ => self.bind_to_instance(member, receiver).map(Some),
                };
            }
        }

        Ok(builtins::object_method(name)
            .map(|method| TreewalkValue::new_method(receiver.clone(), TreewalkValue::BuiltinFunction(method))))
    }

    /// Bind a class member accessed through an instance.
    pub(super) fn bind_to_instance(
        &self,
        member: TreewalkValue,
        receiver: &TreewalkValue,
    ) -> TreewalkResult<TreewalkValue> {
        Ok(match member {
            TreewalkValue::Function(_) => TreewalkValue::new_method(receiver.clone(), member),
            TreewalkValue::Staticmethod(s) => *s.func,
            TreewalkValue::Classmethod(c) => TreewalkValue::new_method(
                TreewalkValue::Class(self.class_of(receiver)),
                *c.func,
            ),
            TreewalkValue::Property(property) => {
                return self.call(&property.fget, args![receiver.clone()])
            }
            other => other,
        })
    }

    /// Bind a class member accessed through the class itself.
    fn bind_to_class(&self, member: TreewalkValue, class: &Container<Class>) -> TreewalkValue {
        match member {
            TreewalkValue::Staticmethod(s) => *s.func,
            TreewalkValue::Classmethod(c) => {
                TreewalkValue::new_method(TreewalkValue::Class(class.clone()), *c.func)
            }
            other => other,
        }
    }

    fn missing_attr<T>(&self, value: &TreewalkValue, name: &str) -> TreewalkResult<T> {
        let message = match value {
            TreewalkValue::Class(class) => format!(
                "type object '{}' has no attribute '{name}'",
                class.borrow().name()
            ),
            TreewalkValue::Module(module) => {
                format!("module '{}' has no attribute '{name}'", module.borrow().name())
            }
            other => format!("'{}' object has no attribute '{name}'", other.type_name()),
        };
        Exception::attribute_error(message).raise(self)
    }

    /// `value.name = new`.
    pub fn set_attr(
        &self,
        value: &TreewalkValue,
        name: &str,
        new: TreewalkValue,
    ) -> TreewalkResult<()> {
        match value {
            TreewalkValue::Object(object) => {
                let member = object.borrow().class().lookup(name);
                if let Some(TreewalkValue::Property(Property { fset, .. })) = member {
                    return match fset {
                        Some(fset) => self.call(&fset, args![value.clone(), new]).map(|_| ()),
                        None => Exception::attribute_error(format!(
                            "property '{name}' of '{}' object has no setter",
                            value.type_name()
                        ))
                        .raise(self),
                    };
                }
                object.borrow_mut().insert(name, new);
                Ok(())
            }
            TreewalkValue::Class(class) if !class.borrow().is_builtin() => {
                class.borrow_mut().insert(name, new);
                Ok(())
            }
            TreewalkValue::Class(class) => Exception::type_error(format!(
                "cannot set '{name}' attribute of immutable type '{}'",
                class.borrow().name()
            ))
            .raise(self),
            TreewalkValue::Module(module) => {
                module.borrow_mut().insert(name, new);
                Ok(())
            }
            TreewalkValue::Function(function) => {
                let mut f = function.borrow_mut();
                match (name, new) {
                    ("__name__", TreewalkValue::Str(s)) => f.name = s,
                    ("__qualname__", TreewalkValue::Str(s)) => f.qualname = s,
                    ("__doc__", TreewalkValue::Str(s)) => f.doc = Some(s),
                    ("__doc__", TreewalkValue::None) => f.doc = None,
                    (_, new) => {
                        f.attrs.insert(name, new);
                    }
                }
                Ok(())
            }
            other => Exception::attribute_error(format!(
                "'{}' object has no attribute '{name}'",
                other.type_name()
            ))
            .raise(self),
        }
    }

    /// `del value.name`.
    pub fn delete_attr(&self, value: &TreewalkValue, name: &str) -> TreewalkResult<()> {
        let removed = match value {
            TreewalkValue::Object(object) => object.borrow_mut().delete(name),
            TreewalkValue::Class(class) if !class.borrow().is_builtin() => {
                class.borrow_mut().delete(name)
            }
            TreewalkValue::Module(module) => module.borrow_mut().delete(name),
            TreewalkValue::Function(function) => function.borrow_mut().attrs.delete(name),
            _ => None,
        };
        match removed {
            Some(_) => Ok(()),
            None => self.missing_attr(value, name),
        }
    }
}

/// A snapshot of a namespace as a `dict`.
fn scope_to_dict(scope: &Scope) -> TreewalkValue {
    let items = scope
        .iter()
        .map(|(name, value)| (TreewalkValue::str(name), value.clone()))
        .collect::<Vec<_>>();
    let mut dict = Dict::default();
    for (key, value) in items {
        // String keys always hash.
        let _ = dict.insert(key, value);
    }
    TreewalkValue::new_dict(dict)
}
